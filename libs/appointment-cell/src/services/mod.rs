pub mod assignment;
pub mod booking;
pub mod store;

pub use assignment::{choose_strategy, least_loaded, SessionCounters};
pub use booking::BookingService;
pub use store::{CsvPatientStore, MemoryPatientStore, PatientStore};
