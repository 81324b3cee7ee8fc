use std::sync::Arc;

use axum::{routing::get, Router};

use crate::handlers;
use crate::services::PresenceService;

pub fn create_doctor_router(presence: Arc<PresenceService>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/presence", get(handlers::get_presence))
        .route("/{doctor_id}/presence", get(handlers::get_doctor_presence))
        .with_state(presence)
}
