//! `/ledger/commit`, `/ledger/keyrotate`, `/ledger/query`, `/ledger/tail`
//! bodies.

use chrono::{DateTime, Utc};
use dualplane_events::Event;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEventRequest {
    pub agent_id: String,
    pub instance_id: String,
    pub public_key_base64: String,
    pub event: Event,
    pub event_hash: String,
    pub signature_base64: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    pub tx_id: String,
    pub accepted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotateRequest {
    pub agent_id: String,
    pub instance_id: String,
    pub new_public_key_base64: String,
    pub signature_base64: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyRotateResponse {
    pub tx_id: String,
    pub accepted_at: DateTime<Utc>,
    pub public_key_base64: String,
}

/// Query params for `GET /ledger/query?txId=...` or `?hash=...`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryParams {
    pub tx_id: Option<String>,
    pub hash: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub status: &'static str,
    pub tx_id: String,
    pub accepted_at: DateTime<Utc>,
    pub agent_id: String,
    pub instance_id: String,
    pub event_hash: String,
    pub event: Event,
}

/// Query params for `GET /ledger/tail?afterTxId=...&limit=N`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TailParams {
    pub after_tx_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TailItem {
    pub tx_id: String,
    pub accepted_at: DateTime<Utc>,
    pub agent_id: String,
    pub instance_id: String,
    pub event_hash: String,
    pub event: Event,
}

#[derive(Debug, Clone, Serialize)]
pub struct TailResponse {
    pub items: Vec<TailItem>,
}

