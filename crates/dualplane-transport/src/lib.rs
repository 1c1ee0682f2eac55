//! dualplane-transport - HTTP/WebSocket surface for the dual-plane
//! coordinator (§6).
//!
//! Exposes `create_router` the same way `openibank_api::create_router`
//! assembles the bank's REST/WebSocket surface, with `handlers::registry`,
//! `handlers::ledger`, `handlers::voting`, `handlers::health` replacing the
//! teacher's trading/account/wallet handler modules.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod websocket;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the complete axum [`Router`] for the coordinator: every
/// private-plane endpoint, the public-plane room stream (spec
/// §6.3), request tracing, CORS, and security headers.
pub fn create_router(state: AppState) -> Router {
    routes::routes()
    .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
    .layer(axum::middleware::from_fn(middleware::timing_middleware))
    .layer(TraceLayer::new_for_http())
    .layer(CorsLayer::permissive())
    .with_state(state)
}

