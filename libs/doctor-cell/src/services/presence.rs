use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::future::join_all;
use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;

use crate::models::{AbsenceReason, Doctor, PresenceReport, ProbeOutcome};
use crate::services::detector::{FaceDetector, HttpFaceDetector};
use crate::services::mjpeg::MjpegFrameReader;
use crate::services::registry::DoctorRegistry;

/// Watches a doctor's feed until a face shows up or the feed fails.
///
/// Implementations are free to run unbounded; `PresenceService` applies the
/// timeout and cancellation.
#[async_trait]
pub trait PresenceProbe: Send + Sync {
    async fn probe(&self, doctor: &Doctor) -> ProbeOutcome;
}

pub struct FeedPresenceProber {
    http_client: Client,
    detector: Arc<dyn FaceDetector>,
}

impl FeedPresenceProber {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_detector(Client::new(), Arc::new(HttpFaceDetector::new(config)))
    }

    pub fn with_detector(http_client: Client, detector: Arc<dyn FaceDetector>) -> Self {
        Self {
            http_client,
            detector,
        }
    }
}

#[async_trait]
impl PresenceProbe for FeedPresenceProber {
    async fn probe(&self, doctor: &Doctor) -> ProbeOutcome {
        let mut response = match self.http_client.get(&doctor.feed_url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!("Feed for {} answered {}", doctor.id, response.status());
                return ProbeOutcome::Absent(AbsenceReason::FeedUnavailable);
            }
            Err(e) => {
                warn!("Could not open feed for {}: {}", doctor.id, e);
                return ProbeOutcome::Absent(AbsenceReason::FeedUnavailable);
            }
        };

        let mut reader = MjpegFrameReader::new();
        let mut frames_checked = 0usize;

        loop {
            let chunk = match response.chunk().await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => {
                    debug!("Feed for {} ended after {} frame(s)", doctor.id, frames_checked);
                    return ProbeOutcome::Absent(AbsenceReason::FrameReadFailed);
                }
                Err(e) => {
                    warn!("Frame read failed for {}: {}", doctor.id, e);
                    return ProbeOutcome::Absent(AbsenceReason::FrameReadFailed);
                }
            };

            reader.push(&chunk);

            while let Some(frame) = reader.next_frame() {
                frames_checked += 1;
                match self.detector.detect(&frame).await {
                    Ok(faces) if !faces.is_empty() => {
                        debug!("Face detected for {} on frame {}", doctor.id, frames_checked);
                        return ProbeOutcome::Present;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Face detection failed for {}: {}", doctor.id, e);
                        return ProbeOutcome::Absent(AbsenceReason::DetectorFailed);
                    }
                }
            }
        }
    }
}

/// Bounded presence checks over the whole registry.
pub struct PresenceService {
    registry: DoctorRegistry,
    prober: Arc<dyn PresenceProbe>,
    timeout: Duration,
    shutdown: watch::Receiver<bool>,
}

impl PresenceService {
    pub fn new(
        registry: DoctorRegistry,
        prober: Arc<dyn PresenceProbe>,
        timeout: Duration,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            registry,
            prober,
            timeout,
            shutdown,
        }
    }

    pub fn registry(&self) -> &DoctorRegistry {
        &self.registry
    }

    #[instrument(skip(self, doctor), fields(doctor_id = %doctor.id))]
    pub async fn probe_doctor(&self, doctor: &Doctor) -> ProbeOutcome {
        let mut shutdown = self.shutdown.clone();
        if *shutdown.borrow() {
            return ProbeOutcome::Cancelled;
        }

        tokio::select! {
            result = tokio::time::timeout(self.timeout, self.prober.probe(doctor)) => {
                match result {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        warn!("No face seen on feed within {:?}", self.timeout);
                        ProbeOutcome::TimedOut
                    }
                }
            }
            _ = wait_for_shutdown(&mut shutdown) => {
                info!("Presence probe cancelled by shutdown");
                ProbeOutcome::Cancelled
            }
        }
    }

    /// Probes every registered doctor concurrently; reports keep registry order.
    pub async fn probe_all(&self) -> Vec<PresenceReport> {
        join_all(self.registry.doctors().iter().map(|doctor| async move {
            let outcome = self.probe_doctor(doctor).await;
            PresenceReport {
                doctor_id: doctor.id.clone(),
                outcome,
                checked_at: Utc::now(),
            }
        }))
        .await
    }

    pub async fn available_doctors(&self) -> Vec<String> {
        let available: Vec<String> = self
            .probe_all()
            .await
            .into_iter()
            .filter(|report| report.outcome.is_present())
            .map(|report| report.doctor_id)
            .collect();

        info!("{} of {} doctor(s) present", available.len(), self.registry.len());
        available
    }
}

async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let stop_requested = shutdown.wait_for(|stop| *stop).await.is_ok();
    // A dropped sender means nobody can ask us to stop.
    if !stop_requested {
        std::future::pending::<()>().await;
    }
}
