//! End-to-end HTTP tests against the assembled [`dualplane_transport::create_router`]
//! surface, exercising the private plane's register -> commit -> query/tail
//! flow and the semantic poll flow through real JSON requests rather than
//! calling handlers directly.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use dualplane_crypto::{sign_message, Keypair};
use dualplane_events::{Event, EventPayload, SemanticClaimUpserted};
use dualplane_ledger::Ledger;
use dualplane_projector::RoomRegistry;
use dualplane_registry::Registry;
use dualplane_transport::{create_router, AppState};
use dualplane_types::{AgentId, EventId};
use dualplane_voting::VotingCoordinator;

fn test_state() -> AppState {
    let registry = Registry::new();
    let ledger = Ledger::with_registry(registry.clone());
    let voting = VotingCoordinator::new(registry.clone(), ledger.clone());
    let rooms = RoomRegistry::default();
    AppState::new(registry, ledger, voting, rooms)
}

async fn json_request( router: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let body = match body {
        Some(value) => Body::from(serde_json::to_vec(&value).unwrap()),
        None => Body::empty(),
    };
    let request = Request::builder()
    .method(method)
    .uri(uri)
    .header("Content-Type", "application/json")
    .body(body)
    .unwrap();

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
    .await
    .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register_instance(router: &axum::Router, agent: &str, instance: &str, kp: &Keypair) {
    let ts = "2026-01-01T00:00:00Z";
    let sig = sign_message(kp, &format!("{agent}:{instance}:{ts}"));
    let (status, _) = json_request( router,
        "POST",
        "/registry/register",
        Some(json!({
                    "agentId": agent,
                    "instanceId": instance,
                    "publicKeyBase64": kp.public_key_base64(),
                    "signatureBase64": sig,
                    "ts": ts,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

fn claim_event(agent: &str, key: &str, value: &str) -> Event {
    Event::new( AgentId::new(agent),
        EventId::generate(),
        EventPayload::SemanticClaimUpserted(SemanticClaimUpserted {
                key: key.to_string(),
                value: value.to_string(),
                confidence: 0.9,
                provenance: "instance-A".to_string(),
        }),
        chrono::Utc::now(),
        None,
    )
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let router = create_router(test_state());
    let (status, body) = json_request(&router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
}

#[tokio::test]
async fn register_commit_query_and_tail_round_trip() {
    let router = create_router(test_state());
    let kp = Keypair::generate();
    register_instance(&router, "agent1", "instanceA", &kp).await;

    let event = claim_event("agent1", "ceo", "Alice");
    let event_hash = event.hash().unwrap();
    let signature = sign_message(&kp, event_hash.as_str());

    let (status, body) = json_request( &router,
        "POST",
        "/ledger/commit",
        Some(json!({
                    "agentId": "agent1",
                    "instanceId": "instanceA",
                    "publicKeyBase64": kp.public_key_base64(),
                    "event": event,
                    "eventHash": event_hash.to_string(),
                    "signatureBase64": signature,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tx_id = body["txId"].as_str().unwrap().to_string();
    assert_eq!(tx_id, "tx_1");

    let (status, body) = json_request( &router,
        "GET",
        &format!("/ledger/query?hash={event_hash}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["txId"], json!(tx_id));

    let (status, body) = json_request(&router, "GET", "/ledger/tail?limit=10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn commit_with_bad_signature_is_rejected() {
    let router = create_router(test_state());
    let kp = Keypair::generate();
    register_instance(&router, "agent1", "instanceA", &kp).await;

    let event = claim_event("agent1", "ceo", "Alice");
    let event_hash = event.hash().unwrap();
    let bad_signature = sign_message(&Keypair::generate(), event_hash.as_str());

    let (status, _) = json_request( &router,
        "POST",
        "/ledger/commit",
        Some(json!({
                    "agentId": "agent1",
                    "instanceId": "instanceA",
                    "publicKeyBase64": kp.public_key_base64(),
                    "event": event,
                    "eventHash": event_hash.to_string(),
                    "signatureBase64": bad_signature,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_json_body_is_a_400_not_a_422() {
    let router = create_router(test_state());
    let request = Request::builder()
    .method("POST")
    .uri("/registry/register")
    .header("Content-Type", "application/json")
    .body(Body::from("{not valid json"))
    .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn query_unknown_hash_is_404() {
    let router = create_router(test_state());
    let (status, _) = json_request(&router, "GET", "/ledger/query?hash=deadbeef", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn semantic_poll_resolves_over_http() {
    let router = create_router(test_state());
    let kp_a = Keypair::generate();
    let kp_b = Keypair::generate();
    register_instance(&router, "agent1", "A", &kp_a).await;
    register_instance(&router, "agent1", "B", &kp_b).await;

    let (status, body) = json_request( &router,
        "POST",
        "/semantic/poll/start",
        Some(json!({
                    "agentId": "agent1",
                    "key": "ceo",
                    "candidates": ["hash-a", "hash-b"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quorumRequired"], json!(1));
    let poll_id = body["pollId"].as_str().unwrap().to_string();

    let message = format!("{poll_id}:hash-a");
    let signature = sign_message(&kp_a, &message);
    let (status, body) = json_request( &router,
        "POST",
        "/semantic/poll/vote",
        Some(json!({
                    "agentId": "agent1",
                    "pollId": poll_id,
                    "instanceId": "A",
                    "publicKeyBase64": kp_a.public_key_base64(),
                    "claimHash": "hash-a",
                    "signatureBase64": signature,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));

    let (status, body) = json_request( &router,
        "GET",
        &format!("/semantic/poll/status?pollId={poll_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["winnerClaimHash"], json!("hash-a"));
}

#[tokio::test]
async fn keyrotate_requires_prior_signature_under_old_key() {
    let router = create_router(test_state());
    let kp_old = Keypair::generate();
    let kp_new = Keypair::generate();
    register_instance(&router, "agent1", "instanceA", &kp_old).await;

    let message = format!("agent1:instanceA:keyrotate:{}", kp_new.public_key_base64());
    let signature = sign_message(&kp_old, &message);

    let (status, body) = json_request( &router,
        "POST",
        "/ledger/keyrotate",
        Some(json!({
                    "agentId": "agent1",
                    "instanceId": "instanceA",
                    "newPublicKeyBase64": kp_new.public_key_base64(),
                    "signatureBase64": signature,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["publicKeyBase64"], json!(kp_new.public_key_base64()));

    let event = claim_event("agent1", "ceo", "Alice");
    let event_hash = event.hash().unwrap();
    let stale_signature = sign_message(&kp_old, event_hash.as_str());

    let (status, _) = json_request( &router,
        "POST",
        "/ledger/commit",
        Some(json!({
                    "agentId": "agent1",
                    "instanceId": "instanceA",
                    "publicKeyBase64": kp_old.public_key_base64(),
                    "event": event,
                    "eventHash": event_hash.to_string(),
                    "signatureBase64": stale_signature,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
