//! Gateway HTTP server.
//!
//! One axum router serves the LINE webhook and the auxiliary read endpoints.
//! The webhook verifies the signature over the raw body before anything is
//! parsed; per-event failures inside a batch are logged, never surfaced.

use crate::config::{
    resolve_channel_access_token, resolve_channel_secret, resolve_database_dsn,
    resolve_knowledge_url, resolve_port, Config,
};
use crate::dispatch::Dispatcher;
use crate::knowledge::{KnowledgeClient, KnowledgeSearch};
use crate::line::{self, LineApiSender, LogOnlySender, ReplySender};
use crate::store::{NewCustomer, NewOrder, Store};
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

const SIGNATURE_HEADER: &str = "X-Line-Signature";

/// How long in-flight requests may drain after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// Shared state for the gateway; constructed once at startup, cloned per request.
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// Webhook signing secret. When absent the webhook rejects every request.
    pub channel_secret: Option<Arc<str>>,
    pub dispatcher: Arc<Dispatcher>,
    pub knowledge: Arc<KnowledgeClient>,
    pub store: Option<Arc<Store>>,
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// GET / — service identity descriptor.
async fn root() -> Json<Value> {
    Json(json!({
        "name": "gasbot",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "language": "Rust",
        "timestamp": timestamp(),
        "description": "九九瓦斯行 LINE Bot",
    }))
}

/// GET /health — liveness plus store reachability when configured.
async fn health(State(state): State<GatewayState>) -> Json<Value> {
    let (status, message) = match state.store {
        Some(ref store) => match store.health().await {
            Ok(()) => ("healthy", "gasbot is running".to_string()),
            Err(e) => ("degraded", format!("database unreachable: {}", e)),
        },
        None => ("healthy", "gasbot is running (no database)".to_string()),
    };
    Json(json!({
        "status": status,
        "message": message,
        "timestamp": timestamp(),
    }))
}

/// POST /api/webhook/line — verify, decode, dispatch.
///
/// 403 when the signature header is missing or wrong (or no secret is
/// configured), 400 when the body does not decode, 200 with empty body
/// otherwise.
async fn webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(ref secret) = state.channel_secret else {
        log::warn!("webhook rejected: no channel secret configured");
        return StatusCode::FORBIDDEN;
    };
    let Some(signature) = headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) else {
        log::warn!("webhook rejected: missing {} header", SIGNATURE_HEADER);
        return StatusCode::FORBIDDEN;
    };
    if !line::verify(secret.as_bytes(), &body, signature) {
        log::warn!("webhook rejected: invalid signature");
        return StatusCode::FORBIDDEN;
    }
    let events = match line::decode(&body) {
        Ok(events) => events,
        Err(e) => {
            log::warn!("webhook rejected: {}", e);
            return StatusCode::BAD_REQUEST;
        }
    };
    state.dispatcher.dispatch(events).await;
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

/// GET /api/knowledge/search?q= — proxy a query to the search collaborator.
async fn knowledge_search(
    State(state): State<GatewayState>,
    Query(params): Query<SearchQuery>,
) -> (StatusCode, Json<Value>) {
    let Some(query) = params.q.filter(|q| !q.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "status": "error", "message": "query parameter 'q' is required" })),
        );
    };
    match state.knowledge.search(&query).await {
        Ok(results) => {
            let count = results.len();
            (
                StatusCode::OK,
                Json(json!({
                    "status": "success",
                    "query": query,
                    "results": results,
                    "count": count,
                    "timestamp": timestamp(),
                })),
            )
        }
        Err(e) => {
            log::error!("knowledge search failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "knowledge search failed" })),
            )
        }
    }
}

/// GET /api/knowledge/stats — collaborator statistics, passed through.
async fn knowledge_stats(State(state): State<GatewayState>) -> (StatusCode, Json<Value>) {
    match state.knowledge.stats().await {
        Ok(stats) => (StatusCode::OK, Json(stats)),
        Err(e) => {
            log::error!("knowledge stats failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "knowledge stats failed" })),
            )
        }
    }
}

/// The fixed product table served when the store is unavailable.
fn static_products() -> Value {
    json!([
        { "id": 1, "name": "4kg 瓦斯 (美崙)",  "price": 250,  "unit": "桶", "station": "美崙" },
        { "id": 2, "name": "4kg 瓦斯 (吉安)",  "price": 210,  "unit": "桶", "station": "吉安" },
        { "id": 3, "name": "10kg 瓦斯 (美崙)", "price": 450,  "unit": "桶", "station": "美崙" },
        { "id": 4, "name": "10kg 瓦斯 (吉安)", "price": 430,  "unit": "桶", "station": "吉安" },
        { "id": 5, "name": "16kg 瓦斯 (美崙)", "price": 630,  "unit": "桶", "station": "美崙" },
        { "id": 6, "name": "16kg 瓦斯 (吉安)", "price": 610,  "unit": "桶", "station": "吉安" },
        { "id": 7, "name": "20kg 瓦斯 (美崙)", "price": 740,  "unit": "桶", "station": "美崙" },
        { "id": 8, "name": "20kg 瓦斯 (吉安)", "price": 720,  "unit": "桶", "station": "吉安" },
        { "id": 9, "name": "50kg 瓦斯 (美崙)", "price": 1850, "unit": "桶", "station": "美崙" },
    ])
}

/// GET /api/products — DB-backed when the store is up, static table otherwise.
async fn products(State(state): State<GatewayState>) -> Json<Value> {
    let products = match state.store {
        Some(ref store) => match store.products().await {
            Ok(rows) => serde_json::to_value(rows).unwrap_or_else(|_| static_products()),
            Err(e) => {
                log::warn!("product query failed, serving static list: {}", e);
                static_products()
            }
        },
        None => static_products(),
    };
    let count = products.as_array().map(|a| a.len()).unwrap_or(0);
    Json(json!({
        "status": "success",
        "products": products,
        "count": count,
        "timestamp": timestamp(),
    }))
}

/// POST /api/customers — insert a customer; 201 with the generated id.
async fn create_customer(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(ref store) = state.store else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "database unavailable" })),
        );
    };
    let customer: NewCustomer = match serde_json::from_slice(&body) {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": format!("invalid JSON: {}", e) })),
            );
        }
    };
    match store.create_customer(&customer).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "status": "success", "id": id, "timestamp": timestamp() })),
        ),
        Err(e) => {
            log::error!("creating customer failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "failed to create customer" })),
            )
        }
    }
}

/// POST /api/orders — insert an order; 201 with the generated id.
async fn create_order(
    State(state): State<GatewayState>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let Some(ref store) = state.store else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "error", "message": "database unavailable" })),
        );
    };
    let order: NewOrder = match serde_json::from_slice(&body) {
        Ok(o) => o,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "status": "error", "message": format!("invalid JSON: {}", e) })),
            );
        }
    };
    match store.create_order(&order).await {
        Ok(id) => (
            StatusCode::CREATED,
            Json(json!({ "status": "success", "id": id, "timestamp": timestamp() })),
        ),
        Err(e) => {
            log::error!("creating order failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "error", "message": "failed to create order" })),
            )
        }
    }
}

/// Build the router over a prepared state (exposed for tests).
pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/webhook/line", post(webhook))
        .route("/api/knowledge/search", get(knowledge_search))
        .route("/api/knowledge/stats", get(knowledge_stats))
        .route("/api/products", get(products))
        .route("/api/customers", post(create_customer))
        .route("/api/orders", post(create_order))
        .with_state(state)
}

/// Wire collaborators from config: reply sender (API client when a token is
/// configured, log-only otherwise), knowledge client, optional store.
async fn build_state(config: Config) -> GatewayState {
    let channel_secret = resolve_channel_secret(&config).map(Arc::<str>::from);
    if channel_secret.is_none() {
        log::warn!("LINE channel secret not configured; webhook requests will be rejected");
    }

    let sender: Arc<dyn ReplySender> = match resolve_channel_access_token(&config) {
        Some(token) => Arc::new(LineApiSender::new(token)),
        None => {
            log::info!("no channel access token configured; replies will be logged only");
            Arc::new(LogOnlySender)
        }
    };

    let knowledge = Arc::new(KnowledgeClient::new(resolve_knowledge_url(&config)));

    let store = match resolve_database_dsn(&config) {
        Some(dsn) => match Store::connect(&dsn).await {
            Ok(store) => {
                log::info!("database connected");
                Some(Arc::new(store))
            }
            Err(e) => {
                // run without persistence rather than failing startup
                log::warn!("database initialization failed: {}", e);
                None
            }
        },
        None => {
            log::info!("no database configured");
            None
        }
    };

    let dispatcher = Arc::new(Dispatcher::new(sender, knowledge.clone(), store.clone()));

    GatewayState {
        config: Arc::new(config),
        channel_secret,
        dispatcher,
        knowledge,
        store,
    }
}

/// Run the gateway server; binds to config.server.bind and the resolved port.
/// Blocks until shutdown (SIGINT/SIGTERM), then drains in-flight requests for
/// up to the grace period.
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.server.bind.trim().to_string();
    let port = resolve_port(&config);
    let state = build_state(config).await;
    let app = router(state);

    let bind_addr = format!("{}:{}", bind, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gasbot listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("gateway server exited")?;
    log::info!("gateway stopped");
    Ok(())
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
/// Arms a watchdog so draining never exceeds the grace period.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!(
        "shutdown signal received, draining in-flight requests (up to {}s)",
        SHUTDOWN_GRACE.as_secs()
    );
    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        log::warn!("shutdown grace period elapsed, exiting");
        std::process::exit(0);
    });
}
