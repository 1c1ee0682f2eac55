//! Mechanical mapping from domain errors to HTTP responses (§3.2).
//!
//! Every domain crate implements `AsErrorKind` on its own error enum;
//! this is the one place that knowledge becomes a `StatusCode` and a JSON
//! body, so `dualplane-ledger`/`dualplane-registry`/`dualplane-voting`
//! never depend on `axum`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dualplane_types::AsErrorKind;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip)]
    pub status: StatusCode,
}

impl ApiError {
    pub fn from_domain<E: AsErrorKind + ToString>(error: E) -> Self {
        let status = StatusCode::from_u16(error.kind().status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            code: error.code().to_string(),
            message: error.to_string(),
            status,
        }
    }

    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            status: StatusCode::BAD_REQUEST,
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            status: StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

