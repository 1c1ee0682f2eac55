//! `/semantic/poll/*` bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPollRequest {
    pub agent_id: String,
    pub key: String,
    pub candidates: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartPollResponse {
    pub poll_id: String,
    pub quorum_required: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub agent_id: String,
    pub poll_id: String,
    pub instance_id: String,
    pub public_key_base64: String,
    pub claim_hash: String,
    pub signature_base64: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VoteResponse {
    pub ok: bool,
}

/// Query params for `GET /semantic/poll/status?pollId=...`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatusParams {
    pub poll_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollStatusResponse {
    pub poll_id: String,
    pub agent_id: String,
    pub key: String,
    pub candidates: Vec<String>,
    pub quorum_required: usize,
    pub votes: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner_claim_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
}

