//! `/semantic/poll/start`, `/semantic/poll/vote`, `/semantic/poll/status`
//! (§4.5).

use axum::extract::{Query, State};
use axum::Json;
use dualplane_types::{AgentId, EventHash, InstanceId, PollId};

use crate::dto::{
    PollStatusParams, PollStatusResponse, StartPollRequest, StartPollResponse, VoteRequest,
    VoteResponse,
};
use crate::error::ApiError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

pub async fn start_poll( State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<StartPollRequest>,
) -> Result<Json<StartPollResponse>, ApiError> {
    if body.agent_id.is_empty() || body.key.is_empty() {
        return Err(ApiError::bad_request( "missing_field",
                "agentId and key are required",
        ));
    }
    if body.candidates.len() < 2 {
        return Err(ApiError::bad_request( "insufficient_candidates",
                "at least two candidates are required to open a poll",
        ));
    }

    let candidates = body.candidates.into_iter().map(EventHash::new).collect();
    let poll_id = state
    .voting
    .start_poll(AgentId::new(body.agent_id), body.key, candidates)
    .await
    .map_err(ApiError::from_domain)?;

    let poll = state
    .voting
    .status(&poll_id)
    .await
    .ok_or_else(|| ApiError::not_found("not_found", "poll vanished immediately after creation"))?;

    Ok(Json(StartPollResponse {
                poll_id: poll_id.to_string(),
                quorum_required: poll.quorum_required,
    }))
}

pub async fn vote( State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<VoteRequest>,
) -> Result<Json<VoteResponse>, ApiError> {
    if body.agent_id.is_empty()
    || body.poll_id.is_empty()
    || body.instance_id.is_empty()
    || body.public_key_base64.is_empty()
    || body.claim_hash.is_empty()
    || body.signature_base64.is_empty()
    {
        return Err(ApiError::bad_request( "missing_field",
                "agentId, pollId, instanceId, publicKeyBase64, claimHash and signatureBase64 are required",
        ));
    }

    state
    .voting
    .vote( &PollId::from(body.poll_id),
        &AgentId::new(body.agent_id),
        InstanceId::new(body.instance_id),
        EventHash::new(body.claim_hash),
        &body.public_key_base64,
        &body.signature_base64,
    )
    .await
    .map_err(ApiError::from_domain)?;

    Ok(Json(VoteResponse { ok: true }))
}

pub async fn status( State(state): State<AppState>,
    Query(params): Query<PollStatusParams>,
) -> Result<Json<PollStatusResponse>, ApiError> {
    if params.poll_id.is_empty() {
        return Err(ApiError::bad_request("missing_field", "pollId is required"));
    }

    let poll_id = PollId::from(params.poll_id);
    let poll = state
    .voting
    .status(&poll_id)
    .await
    .ok_or_else(|| ApiError::not_found("not_found", "no poll with the given pollId"))?;

    Ok(Json(PollStatusResponse {
                poll_id: poll.poll_id.to_string(),
                agent_id: poll.agent_id.to_string(),
                key: poll.key,
                candidates: poll.candidates.iter().map(|c| c.to_string()).collect(),
                quorum_required: poll.quorum_required,
                votes: poll
                .votes
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
                winner_claim_hash: poll.winner_claim_hash.map(|h| h.to_string()),
                decided_at: poll.decided_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualplane_crypto::{sign_message, Keypair};

    async fn register(state: &AppState, agent: &AgentId, instance: &str, kp: &Keypair) {
        let instance_id = InstanceId::new(instance);
        let ts = "2026-01-01T00:00:00Z";
        let sig = sign_message(kp, &format!("{}:{}:{}", agent, instance_id, ts));
        state
        .registry
        .register(agent.clone(), instance_id, kp.public_key_base64(), ts, &sig)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn start_poll_rejects_single_candidate() {
        let state = AppState::test();
        let body = StartPollRequest {
            agent_id: "agent1".to_string(),
            key: "ceo".to_string(),
            candidates: vec!["only-one".to_string()],
        };
        let result = start_poll(State(state), ValidatedJson(body)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn start_vote_status_round_trip_resolves_at_quorum() {
        let state = AppState::test();
        let agent = AgentId::new("agent1");
        let kp_a = Keypair::generate();
        let kp_b = Keypair::generate();
        register(&state, &agent, "A", &kp_a).await;
        register(&state, &agent, "B", &kp_b).await;

        let started = start_poll( State(state.clone()),
            ValidatedJson(StartPollRequest {
                    agent_id: "agent1".to_string(),
                    key: "ceo".to_string(),
                    candidates: vec!["hash-a".to_string(), "hash-b".to_string()],
            }),
        )
        .await
        .unwrap();
        assert_eq!(started.quorum_required, 1);

        let message = format!("{}:hash-a", started.poll_id);
        let sig = sign_message(&kp_a, &message);
        vote( State(state.clone()),
            ValidatedJson(VoteRequest {
                    agent_id: "agent1".to_string(),
                    poll_id: started.poll_id.clone(),
                    instance_id: "A".to_string(),
                    public_key_base64: kp_a.public_key_base64(),
                    claim_hash: "hash-a".to_string(),
                    signature_base64: sig,
            }),
        )
        .await
        .unwrap();

        let polled = status( State(state),
            Query(PollStatusParams {
                    poll_id: started.poll_id,
            }),
        )
        .await
        .unwrap();
        assert_eq!(polled.winner_claim_hash, Some("hash-a".to_string()));
    }
}

