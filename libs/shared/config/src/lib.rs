use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_FACE_DETECTOR_URL: &str = "http://localhost:8501/detect";
pub const DEFAULT_PRESENCE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_PORT: u16 = 3000;

/// One entry of the doctor registry: the doctor's id and the address of the
/// video feed watched for their presence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorFeedConfig {
    pub id: String,
    pub feed_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub doctors: Vec<DoctorFeedConfig>,
    pub records_dir: PathBuf,
    pub face_detector_url: String,
    pub presence_timeout_secs: u64,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            doctors: env::var("DOCTOR_FEEDS")
                .map(|raw| parse_doctor_feeds(&raw))
                .unwrap_or_else(|_| {
                    warn!("DOCTOR_FEEDS not set, no doctors configured");
                    Vec::new()
                }),
            records_dir: env::var("RECORDS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("RECORDS_DIR not set, using ./records");
                    PathBuf::from("records")
                }),
            face_detector_url: env::var("FACE_DETECTOR_URL")
                .unwrap_or_else(|_| {
                    warn!("FACE_DETECTOR_URL not set, using default");
                    DEFAULT_FACE_DETECTOR_URL.to_string()
                }),
            presence_timeout_secs: parsed_var(
                "PRESENCE_TIMEOUT_SECS",
                parse_presence_timeout,
                DEFAULT_PRESENCE_TIMEOUT_SECS,
            ),
            port: parsed_var("PORT", parse_port, DEFAULT_PORT),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - no doctor feeds registered");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.doctors.is_empty()
    }

    pub fn presence_timeout(&self) -> Duration {
        Duration::from_secs(self.presence_timeout_secs)
    }
}

fn parsed_var<T: Display>(key: &str, parse: fn(&str) -> Option<T>, default: T) -> T {
    match env::var(key) {
        Ok(raw) => parse(&raw).unwrap_or_else(|| {
            warn!("Invalid {} value {:?}, using {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

/// Whole seconds; zero would time out every presence check.
pub fn parse_presence_timeout(raw: &str) -> Option<u64> {
    raw.trim().parse().ok().filter(|secs| *secs > 0)
}

pub fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse().ok()
}

/// Parses `doctor1=http://host/video,doctor2=http://other/video`.
/// Malformed entries are skipped with a warning; order is preserved.
pub fn parse_doctor_feeds(raw: &str) -> Vec<DoctorFeedConfig> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.split_once('=') {
            Some((id, url)) if !id.trim().is_empty() && !url.trim().is_empty() => {
                Some(DoctorFeedConfig {
                    id: id.trim().to_string(),
                    feed_url: url.trim().to_string(),
                })
            }
            _ => {
                warn!("Ignoring malformed DOCTOR_FEEDS entry: {}", entry);
                None
            }
        })
        .collect()
}
