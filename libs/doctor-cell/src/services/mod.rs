pub mod detector;
pub mod mjpeg;
pub mod presence;
pub mod registry;

pub use detector::{DetectionParams, FaceDetector, HttpFaceDetector};
pub use mjpeg::MjpegFrameReader;
pub use presence::{FeedPresenceProber, PresenceProbe, PresenceService};
pub use registry::DoctorRegistry;
