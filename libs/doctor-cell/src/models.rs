use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered doctor and the feed used to detect whether they are at
/// their desk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: String,
    pub feed_url: String,
}

/// Candidate face region reported by a detector, in frame pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbsenceReason {
    FeedUnavailable,
    FrameReadFailed,
    DetectorFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Present,
    Absent(AbsenceReason),
    /// The feed stayed open but no face showed up before the cutoff.
    TimedOut,
    Cancelled,
}

impl ProbeOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceReport {
    pub doctor_id: String,
    pub outcome: ProbeOutcome,
    pub checked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResponse {
    #[serde(default)]
    pub faces: Vec<FaceRegion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found: {0}")]
    NotFound(String),

    #[error("Doctor {0} is registered more than once")]
    DuplicateDoctor(String),

    #[error("Invalid doctor id {0:?}: only letters, digits, '-' and '_' are allowed")]
    InvalidDoctorId(String),

    #[error("Face detector error: {0}")]
    DetectorError(String),
}
