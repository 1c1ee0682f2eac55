//! `ValidatedJson`: a thin wrapper over `axum::Json` that turns any body
//! rejection (missing field, wrong type, bad JSON) into the coordinator's
//! own `ApiError` shape at `400 Bad Request` ("Validation error
//! ... Surfaced as 400"), rather than axum's default `422`.

use axum::{
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
T: DeserializeOwned,
S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ValidatedJson(value)),
            Err(rejection) => Err(ApiError::bad_request( "malformed_request_body",
                    rejection.body_text(),
                )
                .into_response()),
        }
    }
}

