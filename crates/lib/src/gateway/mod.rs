//! HTTP gateway: webhook ingestion plus the read-only query API.

mod server;

pub use server::{router, run_gateway, GatewayState};
