use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Path, State},
    Form, Json,
};
use serde_json::{json, Value};
use tracing::info;

use shared_models::error::AppError;

use crate::error::BookingError;
use crate::models::{BookingForm, BookingResponse};
use crate::services::BookingService;

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<BookingService>>,
    form: Result<Form<BookingForm>, FormRejection>,
) -> Result<Json<BookingResponse>, BookingError> {
    let Form(form) = form?;
    let (request, choice) = form.into_request()?;
    info!("Booking request received ({:?})", choice);

    let outcome = service.book(request, choice).await?;

    Ok(Json(BookingResponse {
        success: true,
        message: outcome.message(),
    }))
}

#[axum::debug_handler]
pub async fn get_doctor_load(
    State(service): State<Arc<BookingService>>,
) -> Result<Json<Value>, AppError> {
    let loads = service
        .load()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(json!({
        "doctors": loads,
        "total": loads.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_records(
    State(service): State<Arc<BookingService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let records = service.records(&doctor_id).await.map_err(|e| match e {
        BookingError::UnknownDoctor(_) => AppError::NotFound(e.to_string()),
        _ => AppError::Internal(e.to_string()),
    })?;

    Ok(Json(json!({
        "doctor_id": doctor_id,
        "records": records,
        "total": records.len()
    })))
}
