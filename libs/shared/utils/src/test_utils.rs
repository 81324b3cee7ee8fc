use std::path::{Path, PathBuf};

use shared_config::{AppConfig, DoctorFeedConfig};

pub struct TestConfig {
    pub doctors: Vec<DoctorFeedConfig>,
    pub records_dir: PathBuf,
    pub face_detector_url: String,
    pub presence_timeout_secs: u64,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            doctors: doctor_feeds(&["doctor1", "doctor2", "doctor3"]),
            records_dir: PathBuf::from("records"),
            face_detector_url: "http://localhost:8501/detect".to_string(),
            presence_timeout_secs: 1,
        }
    }
}

impl TestConfig {
    pub fn with_doctors(mut self, ids: &[&str]) -> Self {
        self.doctors = doctor_feeds(ids);
        self
    }

    pub fn with_records_dir(mut self, dir: &Path) -> Self {
        self.records_dir = dir.to_path_buf();
        self
    }

    pub fn with_face_detector_url(mut self, url: &str) -> Self {
        self.face_detector_url = url.to_string();
        self
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            doctors: self.doctors.clone(),
            records_dir: self.records_dir.clone(),
            face_detector_url: self.face_detector_url.clone(),
            presence_timeout_secs: self.presence_timeout_secs,
            port: 0,
        }
    }
}

/// Feeds pointing at a reserved, never-resolving host.
pub fn doctor_feeds(ids: &[&str]) -> Vec<DoctorFeedConfig> {
    ids.iter()
        .map(|id| DoctorFeedConfig {
            id: id.to_string(),
            feed_url: format!("http://{}.cameras.invalid:4747/video", id),
        })
        .collect()
}

pub struct TestPatient {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub phone: String,
    pub email: String,
}

impl Default for TestPatient {
    fn default() -> Self {
        Self::named("Jane Doe")
    }
}

impl TestPatient {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            age: "42".to_string(),
            gender: "Female".to_string(),
            phone: "+1 555 0100".to_string(),
            email: "jane.doe@example.com".to_string(),
        }
    }

    /// URL-encoded booking form as the browser would submit it.
    pub fn form_body(&self, doctor: &str) -> String {
        encode_form(&[
            ("name", self.name.as_str()),
            ("age", self.age.as_str()),
            ("gender", self.gender.as_str()),
            ("phone", self.phone.as_str()),
            ("email", self.email.as_str()),
            ("doctor", doctor),
        ])
    }
}

pub fn encode_form(fields: &[(&str, &str)]) -> String {
    fields
        .iter()
        .map(|(key, value)| format!("{}={}", urlencoding::encode(key), urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Minimal JPEG skeleton: SOI, an empty scan header, `payload` as scan
/// data, EOI.
pub fn jpeg_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![0xFF, 0xD8, 0xFF, 0xDA, 0x00, 0x02];
    frame.extend_from_slice(payload);
    frame.extend_from_slice(&[0xFF, 0xD9]);
    frame
}

/// Multipart MJPEG body in the shape phone webcam apps serve.
pub fn mjpeg_stream(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut body = Vec::new();
    for frame in frames {
        body.extend_from_slice(b"--frame\r\nContent-Type: image/jpeg\r\n");
        body.extend_from_slice(format!("Content-Length: {}\r\n\r\n", frame.len()).as_bytes());
        body.extend_from_slice(frame);
        body.extend_from_slice(b"\r\n");
    }
    body
}
