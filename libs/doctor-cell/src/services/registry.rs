use std::collections::HashSet;

use tracing::info;

use shared_config::{AppConfig, DoctorFeedConfig};

use crate::models::{Doctor, DoctorError};

/// Fixed, ordered set of doctors known to the service. Order matters: it is
/// the tie-break order of the assignment policy.
#[derive(Debug, Clone, Default)]
pub struct DoctorRegistry {
    doctors: Vec<Doctor>,
}

impl DoctorRegistry {
    pub fn from_config(config: &AppConfig) -> Result<Self, DoctorError> {
        Self::from_feeds(&config.doctors)
    }

    pub fn from_feeds(feeds: &[DoctorFeedConfig]) -> Result<Self, DoctorError> {
        let mut seen = HashSet::new();
        let mut doctors = Vec::with_capacity(feeds.len());

        for feed in feeds {
            if !is_valid_doctor_id(&feed.id) {
                return Err(DoctorError::InvalidDoctorId(feed.id.clone()));
            }
            if !seen.insert(feed.id.clone()) {
                return Err(DoctorError::DuplicateDoctor(feed.id.clone()));
            }
            doctors.push(Doctor {
                id: feed.id.clone(),
                feed_url: feed.feed_url.clone(),
            });
        }

        info!("Registered {} doctor(s)", doctors.len());
        Ok(Self { doctors })
    }

    pub fn doctors(&self) -> &[Doctor] {
        &self.doctors
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.doctors.iter().map(|d| d.id.as_str())
    }

    pub fn get(&self, doctor_id: &str) -> Option<&Doctor> {
        self.doctors.iter().find(|d| d.id == doctor_id)
    }

    pub fn contains(&self, doctor_id: &str) -> bool {
        self.get(doctor_id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.doctors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.doctors.len()
    }
}

/// Ids double as record file names, so keep them to a safe alphabet.
pub fn is_valid_doctor_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
