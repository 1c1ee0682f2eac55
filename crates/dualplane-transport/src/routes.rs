//! Route table for the dual-plane coordinator (§6.3).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;
use crate::websocket;

/// All nine private-plane endpoints plus the public-plane room stream
/// (§6.3), nested under no prefix: the coordinator is a
/// single-purpose service, not one API among several.
pub fn routes() -> Router<AppState> {
    Router::new()
    .route("/health", get(handlers::health::health))
    .route("/registry/register", post(handlers::registry::register))
    .route("/ledger/commit", post(handlers::ledger::commit))
    .route("/ledger/keyrotate", post(handlers::ledger::keyrotate))
    .route("/ledger/query", get(handlers::ledger::query))
    .route("/ledger/tail", get(handlers::ledger::tail))
    .route("/semantic/poll/start", post(handlers::voting::start_poll))
    .route("/semantic/poll/vote", post(handlers::voting::vote))
    .route("/semantic/poll/status", get(handlers::voting::status))
    .route("/stream/*room", get(websocket::stream_handler))
}
