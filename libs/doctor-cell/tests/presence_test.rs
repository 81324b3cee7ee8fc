// libs/doctor-cell/tests/presence_test.rs
// Presence probing against mocked camera feeds and a mocked face detector

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use mockall::mock;
use serde_json::json;
use tokio::sync::watch;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{AbsenceReason, Doctor, ProbeOutcome};
use doctor_cell::services::{DoctorRegistry, FeedPresenceProber, PresenceProbe, PresenceService};
use shared_utils::test_utils::{doctor_feeds, jpeg_frame, mjpeg_stream, TestConfig};

mock! {
    pub Probe {}

    #[async_trait]
    impl PresenceProbe for Probe {
        async fn probe(&self, doctor: &Doctor) -> ProbeOutcome;
    }
}

/// Never finishes, like a live feed with an empty chair in front of it.
struct StalledProbe;

#[async_trait]
impl PresenceProbe for StalledProbe {
    async fn probe(&self, _doctor: &Doctor) -> ProbeOutcome {
        std::future::pending().await
    }
}

fn doctor(id: &str, feed_url: String) -> Doctor {
    Doctor {
        id: id.to_string(),
        feed_url,
    }
}

fn prober_for(detector_server: &MockServer) -> FeedPresenceProber {
    let config = TestConfig::default()
        .with_face_detector_url(&format!("{}/detect", detector_server.uri()))
        .to_app_config();
    FeedPresenceProber::new(&config)
}

async fn mount_feed(server: &MockServer, frames: &[Vec<u8>]) {
    Mock::given(method("GET"))
        .and(path("/video"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(mjpeg_stream(frames), "multipart/x-mixed-replace; boundary=frame"),
        )
        .mount(server)
        .await;
}

async fn mount_detector(server: &MockServer, faces: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "faces": faces })))
        .mount(server)
        .await;
}

fn registry(ids: &[&str]) -> DoctorRegistry {
    DoctorRegistry::from_feeds(&doctor_feeds(ids)).unwrap()
}

#[tokio::test]
async fn unreachable_feed_is_absent() {
    let server = MockServer::start().await;
    let prober = prober_for(&server);

    let outcome = prober
        .probe(&doctor("doctor1", "http://127.0.0.1:1/video".to_string()))
        .await;

    assert_eq!(outcome, ProbeOutcome::Absent(AbsenceReason::FeedUnavailable));
}

#[tokio::test]
async fn feed_error_status_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/video"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert_eq!(outcome, ProbeOutcome::Absent(AbsenceReason::FeedUnavailable));
}

#[tokio::test]
async fn face_on_feed_means_present() {
    let server = MockServer::start().await;
    mount_feed(&server, &[jpeg_frame(b"frame-1"), jpeg_frame(b"frame-2")]).await;
    mount_detector(&server, json!([{ "x": 10, "y": 12, "width": 80, "height": 90 }])).await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert_eq!(outcome, ProbeOutcome::Present);
}

#[tokio::test]
async fn detection_params_are_forwarded() {
    let server = MockServer::start().await;
    mount_feed(&server, &[jpeg_frame(b"frame")]).await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .and(query_param("scale_factor", "1.3"))
        .and(query_param("min_neighbors", "5"))
        .and(query_param("min_width", "50"))
        .and(query_param("min_height", "50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "faces": [{ "x": 0, "y": 0, "width": 64, "height": 64 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert!(outcome.is_present());
}

#[tokio::test]
async fn feed_ending_without_face_is_frame_read_failure() {
    let server = MockServer::start().await;
    mount_feed(&server, &[jpeg_frame(b"empty-chair"), jpeg_frame(b"still-empty")]).await;
    mount_detector(&server, json!([])).await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert_eq!(outcome, ProbeOutcome::Absent(AbsenceReason::FrameReadFailed));
}

#[tokio::test]
async fn regions_below_minimum_size_are_ignored() {
    let server = MockServer::start().await;
    mount_feed(&server, &[jpeg_frame(b"far-away")]).await;
    mount_detector(&server, json!([{ "x": 5, "y": 5, "width": 20, "height": 20 }])).await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert_eq!(outcome, ProbeOutcome::Absent(AbsenceReason::FrameReadFailed));
}

#[tokio::test]
async fn detector_failure_is_not_presence() {
    let server = MockServer::start().await;
    mount_feed(&server, &[jpeg_frame(b"frame")]).await;
    Mock::given(method("POST"))
        .and(path("/detect"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let outcome = prober_for(&server)
        .probe(&doctor("doctor1", format!("{}/video", server.uri())))
        .await;

    assert_eq!(outcome, ProbeOutcome::Absent(AbsenceReason::DetectorFailed));
}

#[tokio::test]
async fn stalled_feed_times_out() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = PresenceService::new(
        registry(&["doctor1"]),
        Arc::new(StalledProbe),
        Duration::from_millis(50),
        shutdown_rx,
    );

    let doctor = service.registry().doctors()[0].clone();
    assert_eq!(service.probe_doctor(&doctor).await, ProbeOutcome::TimedOut);
}

#[tokio::test]
async fn shutdown_cancels_running_probe() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let service = Arc::new(PresenceService::new(
        registry(&["doctor1"]),
        Arc::new(StalledProbe),
        Duration::from_secs(30),
        shutdown_rx,
    ));

    let running = {
        let service = service.clone();
        tokio::spawn(async move {
            let doctor = service.registry().doctors()[0].clone();
            service.probe_doctor(&doctor).await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    shutdown_tx.send(true).unwrap();

    let outcome = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("probe should stop after shutdown")
        .unwrap();
    assert_eq!(outcome, ProbeOutcome::Cancelled);
}

#[tokio::test]
async fn probe_after_shutdown_is_cancelled_immediately() {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    shutdown_tx.send(true).unwrap();

    let mut probe = MockProbe::new();
    probe.expect_probe().never();

    let service = PresenceService::new(
        registry(&["doctor1"]),
        Arc::new(probe),
        Duration::from_secs(1),
        shutdown_rx,
    );

    let doctor = service.registry().doctors()[0].clone();
    assert_eq!(service.probe_doctor(&doctor).await, ProbeOutcome::Cancelled);
}

#[tokio::test]
async fn probe_all_keeps_registry_order() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut probe = MockProbe::new();
    probe.expect_probe().times(3).returning(|doctor| match doctor.id.as_str() {
        "doctor2" => ProbeOutcome::Present,
        "doctor3" => ProbeOutcome::TimedOut,
        _ => ProbeOutcome::Absent(AbsenceReason::FeedUnavailable),
    });

    let service = PresenceService::new(
        registry(&["doctor1", "doctor2", "doctor3"]),
        Arc::new(probe),
        Duration::from_secs(1),
        shutdown_rx,
    );

    let reports = service.probe_all().await;
    let ids: Vec<&str> = reports.iter().map(|r| r.doctor_id.as_str()).collect();
    assert_eq!(ids, vec!["doctor1", "doctor2", "doctor3"]);
    assert_matches!(reports[0].outcome, ProbeOutcome::Absent(AbsenceReason::FeedUnavailable));
    assert_matches!(reports[2].outcome, ProbeOutcome::TimedOut);
}

#[tokio::test]
async fn only_present_doctors_are_available() {
    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut probe = MockProbe::new();
    probe.expect_probe().returning(|doctor| {
        if doctor.id == "doctor3" {
            ProbeOutcome::Present
        } else {
            ProbeOutcome::TimedOut
        }
    });

    let service = PresenceService::new(
        registry(&["doctor1", "doctor2", "doctor3"]),
        Arc::new(probe),
        Duration::from_secs(1),
        shutdown_rx,
    );

    assert_eq!(service.available_doctors().await, vec!["doctor3".to_string()]);
}
