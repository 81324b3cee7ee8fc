use async_trait::async_trait;
use reqwest::{header, Client};
use tracing::debug;

use shared_config::AppConfig;

use crate::models::{DetectionResponse, DoctorError, FaceRegion};

/// Runs one face-detection pass over a single JPEG frame.
#[async_trait]
pub trait FaceDetector: Send + Sync {
    async fn detect(&self, frame: &[u8]) -> Result<Vec<FaceRegion>, DoctorError>;
}

/// Cascade tuning forwarded to the detection service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionParams {
    pub scale_factor: f32,
    pub min_neighbors: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_width: 50,
            min_height: 50,
        }
    }
}

/// Posts frames to an HTTP face-detection service which answers with
/// `{"faces": [{"x":..,"y":..,"width":..,"height":..}]}`.
pub struct HttpFaceDetector {
    http_client: Client,
    endpoint: String,
    params: DetectionParams,
}

impl HttpFaceDetector {
    pub fn new(config: &AppConfig) -> Self {
        Self::with_endpoint(Client::new(), &config.face_detector_url, DetectionParams::default())
    }

    pub fn with_endpoint(http_client: Client, endpoint: &str, params: DetectionParams) -> Self {
        Self {
            http_client,
            endpoint: endpoint.to_string(),
            params,
        }
    }
}

#[async_trait]
impl FaceDetector for HttpFaceDetector {
    async fn detect(&self, frame: &[u8]) -> Result<Vec<FaceRegion>, DoctorError> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[
                ("scale_factor", self.params.scale_factor.to_string()),
                ("min_neighbors", self.params.min_neighbors.to_string()),
                ("min_width", self.params.min_width.to_string()),
                ("min_height", self.params.min_height.to_string()),
            ])
            .header(header::CONTENT_TYPE, "image/jpeg")
            .body(frame.to_vec())
            .send()
            .await
            .map_err(|e| DoctorError::DetectorError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DoctorError::DetectorError(format!(
                "detector returned {}",
                response.status()
            )));
        }

        let detection: DetectionResponse = response
            .json()
            .await
            .map_err(|e| DoctorError::DetectorError(e.to_string()))?;

        let faces: Vec<FaceRegion> = detection
            .faces
            .into_iter()
            .filter(|face| face.width >= self.params.min_width && face.height >= self.params.min_height)
            .collect();

        debug!("Detector found {} face(s) in {} byte frame", faces.len(), frame.len());
        Ok(faces)
    }
}
