use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::{create_appointment_router, handlers::book_appointment, BookingService};
use doctor_cell::{create_doctor_router, PresenceService};

pub fn create_router(presence: Arc<PresenceService>, booking: Arc<BookingService>) -> Router {
    // The booking form posts to the site root.
    let root = Router::new()
        .route("/", get(|| async { "Clinic booking API is running!" }).post(book_appointment))
        .with_state(booking.clone());

    root.nest("/appointments", create_appointment_router(booking))
        .nest("/doctors", create_doctor_router(presence))
}
