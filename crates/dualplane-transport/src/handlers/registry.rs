//! `POST /registry/register` (§4.1).

use axum::{extract::State, Json};
use dualplane_types::{AgentId, InstanceId};

use crate::dto::{RegisterRequest, RegisterResponse};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

pub async fn register( State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    if body.agent_id.is_empty()
    || body.instance_id.is_empty()
    || body.public_key_base64.is_empty()
    || body.signature_base64.is_empty()
    || body.ts.is_empty()
    {
        return Err(ApiError::bad_request( "missing_field",
                "agentId, instanceId, publicKeyBase64, signatureBase64 and ts are required",
        ));
    }

    let outcome = state
    .registry
    .register( AgentId::new(body.agent_id),
        InstanceId::new(body.instance_id),
        body.public_key_base64,
        &body.ts,
        &body.signature_base64,
    )
    .await
    .map_err(ApiError::from_domain)?;

    Ok(Json(RegisterResponse {
                ok: true,
                registered_at: outcome.registered_at,
    }))
}
