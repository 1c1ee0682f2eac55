//! Cross-cutting request middleware (transport boundary).
//!
//! Grounded on `openibank_api::middleware`'s `timing_middleware` and
//! `security_headers_middleware`; the teacher's auth/2FA/trading/rate-limit
//! middleware have no counterpart here (the coordinator's write paths are
//! authenticated per-request by signature, not by session), see DESIGN.md.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;

/// Log request latency, flagging anything over a second.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    if elapsed.as_millis() > 1000 {
        tracing::warn!(%method, %uri, elapsed_ms = elapsed.as_millis(), "slow request");
    } else {
        tracing::debug!( %method,
            %uri,
            elapsed_ms = elapsed.as_millis(),
            status = response.status().as_u16(),
            "request completed"
        );
    }

    response
}

/// Standard hardening headers for a service with no browser-rendered
/// surface of its own.
pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert("X-Content-Type-Options", "nosniff".parse().unwrap());
    headers.insert("X-Frame-Options", "DENY".parse().unwrap());
    headers.insert( "Referrer-Policy",
        "strict-origin-when-cross-origin".parse().unwrap(),
    );
    headers.insert( "Cache-Control",
        "no-store, no-cache, must-revalidate".parse().unwrap(),
    );

    response
}

