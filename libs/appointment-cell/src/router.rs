use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::services::BookingService;

pub fn create_appointment_router(service: Arc<BookingService>) -> Router {
    Router::new()
        .route("/", post(handlers::book_appointment))
        .route("/load", get(handlers::get_doctor_load))
        .route("/{doctor_id}", get(handlers::get_doctor_records))
        .with_state(service)
}
