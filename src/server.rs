//! HTTP surface
//!
//! ```text
//! GET  /api                      - health acknowledgement
//! POST /api/automation/{action}  - run one action, JSON body = its parameters
//! ```
//!
//! Engine-level failures are reported inside the `ActionResult` body with
//! HTTP 200. Only unknown actions and malformed parameters are rejected with
//! HTTP 400.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::actions::Action;
use crate::tools::AutomationEngine;

/// Build the typed action for `name` from a request body; an empty body
/// means no parameters.
pub fn parse_action(name: &str, body: &[u8]) -> Result<Action, serde_json::Error> {
    let params: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        serde_json::from_slice(body)?
    };
    serde_json::from_value(json!({ "action": name, "params": params }))
}

async fn health(State(engine): State<Arc<AutomationEngine>>) -> impl IntoResponse {
    Json(engine.health())
}

async fn run_action(
    State(engine): State<Arc<AutomationEngine>>,
    Path(action): Path<String>,
    body: Bytes,
) -> Response {
    let action = match parse_action(&action, &body) {
        Ok(action) => action,
        Err(e) => {
            warn!("Rejected request for action '{}': {}", action, e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": format!("Invalid action request: {}", e) })),
            )
                .into_response();
        }
    };

    Json(engine.execute(action).await).into_response()
}

pub fn router(engine: Arc<AutomationEngine>) -> Router {
    Router::new()
        .route("/api", get(health))
        .route("/api/automation/{action}", post(run_action))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// Serve the router on `addr` until `shutdown` resolves
pub async fn start_server(
    addr: SocketAddr,
    engine: Arc<AutomationEngine>,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("Browser automation engine listening on {}", addr);
    axum::serve(listener, router(engine))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
