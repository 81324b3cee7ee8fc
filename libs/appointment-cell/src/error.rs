use axum::{
    extract::rejection::FormRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::models::BookingResponse;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("No doctor available")]
    NoDoctorAvailable,

    #[error("Unknown doctor: {0}")]
    UnknownDoctor(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid booking form: {0}")]
    InvalidForm(#[from] FormRejection),

    #[error("Could not write patient record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Patient record file is unreadable: {0}")]
    Csv(#[from] csv::Error),

    #[error("Record store error: {0}")]
    Store(String),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::NoDoctorAvailable => StatusCode::SERVICE_UNAVAILABLE,
            BookingError::UnknownDoctor(_) | BookingError::MissingField(_) => StatusCode::BAD_REQUEST,
            BookingError::InvalidForm(rejection) => rejection.status(),
            BookingError::Io(_) | BookingError::Csv(_) | BookingError::Store(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Booking failed: {}", self);
        } else {
            warn!("Booking rejected: {}", self);
        }

        let body = Json(BookingResponse {
            success: false,
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}
