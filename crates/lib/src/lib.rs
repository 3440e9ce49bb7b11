//! gasbot core library — webhook pipeline, intent classification, knowledge
//! search, persistence, and the HTTP gateway used by the CLI binary.

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod intent;
pub mod knowledge;
pub mod line;
pub mod replies;
pub mod store;
