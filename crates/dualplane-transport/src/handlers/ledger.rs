//! `/ledger/commit`, `/ledger/keyrotate`, `/ledger/query`, `/ledger/tail`
//! (§4.2).

use axum::extract::{Query, State};
use axum::Json;
use dualplane_ledger::{CommitRequest, Query as LedgerQuery, TxRecord};
use dualplane_types::{AgentId, EventHash, InstanceId, TxId};

use crate::dto::{
    CommitEventRequest, CommitResponse, KeyRotateRequest, KeyRotateResponse, QueryParams,
    QueryResponse, TailItem, TailParams, TailResponse,
};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

pub async fn commit( State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CommitEventRequest>,
) -> Result<Json<CommitResponse>, ApiError> {
    if body.agent_id.is_empty()
    || body.instance_id.is_empty()
    || body.public_key_base64.is_empty()
    || body.event_hash.is_empty()
    || body.signature_base64.is_empty()
    {
        return Err(ApiError::bad_request( "missing_field",
                "agentId, instanceId, publicKeyBase64, eventHash and signatureBase64 are required",
        ));
    }

    let record = state
    .ledger
    .commit(CommitRequest {
            agent_id: AgentId::new(body.agent_id),
            instance_id: InstanceId::new(body.instance_id),
            public_key_base64: body.public_key_base64,
            event: body.event,
            event_hash: EventHash::new(body.event_hash),
            signature_base64: body.signature_base64,
    })
    .await
    .map_err(ApiError::from_domain)?;

    Ok(Json(CommitResponse {
                tx_id: record.tx_id.to_string(),
                accepted_at: record.accepted_at,
    }))
}

pub async fn keyrotate( State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<KeyRotateRequest>,
) -> Result<Json<KeyRotateResponse>, ApiError> {
    if body.agent_id.is_empty()
    || body.instance_id.is_empty()
    || body.new_public_key_base64.is_empty()
    || body.signature_base64.is_empty()
    {
        return Err(ApiError::bad_request( "missing_field",
                "agentId, instanceId, newPublicKeyBase64 and signatureBase64 are required",
        ));
    }

    let agent_id = AgentId::new(body.agent_id);
    let instance_id = InstanceId::new(body.instance_id);
    let new_key = body.new_public_key_base64.clone();

    let event = state
    .registry
    .rotate_key( agent_id.clone(),
        instance_id.clone(),
        body.new_public_key_base64,
        &body.signature_base64,
    )
    .await
    .map_err(ApiError::from_domain)?;

    let record = state
    .ledger
    .commit_internal(agent_id, instance_id, event)
    .await
    .map_err(ApiError::from_domain)?;

    Ok(Json(KeyRotateResponse {
                tx_id: record.tx_id.to_string(),
                accepted_at: record.accepted_at,
                public_key_base64: new_key,
    }))
}

pub async fn query( State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<QueryResponse>, ApiError> {
    let tx_id = match &params.tx_id {
        Some(raw) => Some( raw.parse::<TxId>()
            .map_err(|_| ApiError::bad_request("invalid_tx_id", "txId is not a valid transaction id"))?,
        ),
        None => None,
    };
    let hash = params.hash.clone().map(EventHash::new);

    if tx_id.is_none() && hash.is_none() {
        return Err(ApiError::bad_request( "missing_field",
                "either txId or hash must be provided",
        ));
    }

    let record = state
    .ledger
    .query(LedgerQuery { tx_id, hash })
    .await
    .ok_or_else(|| ApiError::not_found("not_found", "no record for the given txId/hash"))?;

    Ok(Json(record_to_query_response(record)))
}

pub async fn tail( State(state): State<AppState>,
    Query(params): Query<TailParams>,
) -> Result<Json<TailResponse>, ApiError> {
    let after_tx_id = match &params.after_tx_id {
        Some(raw) => Some( raw.parse::<TxId>()
            .map_err(|_| ApiError::bad_request("invalid_tx_id", "afterTxId is not a valid transaction id"))?,
        ),
        None => None,
    };
    let limit = params
    .limit
    .unwrap_or(dualplane_ledger::DEFAULT_TAIL_LIMIT)
    .clamp(dualplane_ledger::MIN_TAIL_LIMIT, dualplane_ledger::MAX_TAIL_LIMIT);

    let items = state
    .ledger
    .tail(after_tx_id, limit)
    .await
    .into_iter()
    .map(record_to_tail_item)
    .collect();

    Ok(Json(TailResponse { items }))
}

fn record_to_query_response(record: TxRecord) -> QueryResponse {
    QueryResponse {
        status: "included",
        tx_id: record.tx_id.to_string(),
        accepted_at: record.accepted_at,
        agent_id: record.agent_id.to_string(),
        instance_id: record.instance_id.to_string(),
        event_hash: record.event_hash.to_string(),
        event: record.event,
    }
}

fn record_to_tail_item(record: TxRecord) -> TailItem {
    TailItem {
        tx_id: record.tx_id.to_string(),
        accepted_at: record.accepted_at,
        agent_id: record.agent_id.to_string(),
        instance_id: record.instance_id.to_string(),
        event_hash: record.event_hash.to_string(),
        event: record.event,
    }
}
