// libs/doctor-cell/tests/handlers_test.rs

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use tokio::sync::watch;
use tower::ServiceExt;

use doctor_cell::create_doctor_router;
use doctor_cell::models::{AbsenceReason, Doctor, ProbeOutcome};
use doctor_cell::services::{DoctorRegistry, PresenceProbe, PresenceService};
use shared_utils::test_utils::TestConfig;

/// doctor1 is at the desk, everyone else's camera is off.
struct FixedProbe;

#[async_trait]
impl PresenceProbe for FixedProbe {
    async fn probe(&self, doctor: &Doctor) -> ProbeOutcome {
        if doctor.id == "doctor1" {
            ProbeOutcome::Present
        } else {
            ProbeOutcome::Absent(AbsenceReason::FeedUnavailable)
        }
    }
}

fn create_test_app() -> Router {
    let config = TestConfig::default().to_app_config();
    let registry = DoctorRegistry::from_config(&config).unwrap();
    // Without a sender nothing can cancel the probes.
    let (_, shutdown_rx) = watch::channel(false);

    let presence = Arc::new(PresenceService::new(
        registry,
        Arc::new(FixedProbe),
        Duration::from_secs(1),
        shutdown_rx,
    ));
    create_doctor_router(presence)
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn test_list_doctors() {
    let (status, json) = get_json(create_test_app(), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["doctors"][0]["id"], "doctor1");
    assert_eq!(json["doctors"][2]["id"], "doctor3");
}

#[tokio::test]
async fn test_presence_for_all_doctors() {
    let (status, json) = get_json(create_test_app(), "/presence").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["available"], 1);
    assert_eq!(json["reports"][0]["outcome"]["status"], "present");
    assert_eq!(json["reports"][1]["outcome"]["status"], "absent");
    assert_eq!(json["reports"][1]["outcome"]["reason"], "feed_unavailable");
}

#[tokio::test]
async fn test_presence_for_one_doctor() {
    let (status, json) = get_json(create_test_app(), "/doctor1/presence").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["doctor_id"], "doctor1");
    assert_eq!(json["outcome"]["status"], "present");
    assert!(json.get("checked_at").is_some());
}

#[tokio::test]
async fn test_presence_for_unknown_doctor() {
    let (status, json) = get_json(create_test_app(), "/doctor9/presence").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
    assert!(json["message"].as_str().unwrap().contains("doctor9"));
}
