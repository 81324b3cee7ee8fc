use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::error::AppError;

use crate::models::{DoctorError, PresenceReport};
use crate::services::PresenceService;

#[axum::debug_handler]
pub async fn list_doctors(
    State(presence): State<Arc<PresenceService>>,
) -> Result<Json<Value>, AppError> {
    let doctors = presence.registry().doctors();

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_presence(
    State(presence): State<Arc<PresenceService>>,
) -> Result<Json<Value>, AppError> {
    let reports = presence.probe_all().await;
    let available = reports.iter().filter(|r| r.outcome.is_present()).count();

    Ok(Json(json!({
        "reports": reports,
        "available": available
    })))
}

#[axum::debug_handler]
pub async fn get_doctor_presence(
    State(presence): State<Arc<PresenceService>>,
    Path(doctor_id): Path<String>,
) -> Result<Json<PresenceReport>, AppError> {
    debug!("Presence check requested for {}", doctor_id);

    let doctor = presence
        .registry()
        .get(&doctor_id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(DoctorError::NotFound(doctor_id.clone()).to_string()))?;

    let outcome = presence.probe_doctor(&doctor).await;

    Ok(Json(PresenceReport {
        doctor_id: doctor.id,
        outcome,
        checked_at: Utc::now(),
    }))
}
