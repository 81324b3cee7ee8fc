use serde::{Deserialize, Serialize};

use crate::error::BookingError;

/// Value of the `doctor` form field that asks the service to pick a doctor.
pub const AUTO_ASSIGN_SENTINEL: &str = "None";

/// Column order of every per-doctor record file.
pub const RECORD_HEADER: [&str; 6] = ["Name", "Age", "Sex", "Phone Number", "Email", "Doctor"];

/// Raw booking form as posted by the browser. Every field is optional here so
/// that missing input is reported by `into_request` rather than by the
/// extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingForm {
    pub name: Option<String>,
    pub age: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub doctor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub name: String,
    pub age: String,
    pub sex: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DoctorChoice {
    Auto,
    Specific(String),
}

impl DoctorChoice {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") | Some(AUTO_ASSIGN_SENTINEL) => DoctorChoice::Auto,
            Some(doctor_id) => DoctorChoice::Specific(doctor_id.to_string()),
        }
    }
}

impl BookingForm {
    pub fn into_request(self) -> Result<(BookingRequest, DoctorChoice), BookingError> {
        let request = BookingRequest {
            name: required(self.name, "name")?,
            age: required(self.age, "age")?,
            sex: required(self.gender, "gender")?,
            phone: required(self.phone, "phone")?,
            email: required(self.email, "email")?,
        };

        Ok((request, DoctorChoice::parse(self.doctor.as_deref())))
    }
}

fn required(value: Option<String>, field: &'static str) -> Result<String, BookingError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(BookingError::MissingField(field)),
    }
}

/// One persisted row: the booking plus the doctor it was assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignmentRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Age")]
    pub age: String,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "Phone Number")]
    pub phone: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Doctor")]
    pub doctor_id: String,
}

impl AssignmentRecord {
    pub fn new(request: BookingRequest, doctor_id: &str) -> Self {
        Self {
            name: request.name,
            age: request.age,
            sex: request.sex,
            phone: request.phone,
            email: request.email,
            doctor_id: doctor_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStrategy {
    /// Fewest patients assigned since the process started.
    Local,
    /// Fewest persisted records; used when nobody is at their desk.
    Overall,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub doctor_id: String,
    /// `None` when the caller named the doctor.
    pub strategy: Option<AssignmentStrategy>,
    pub record: AssignmentRecord,
}

impl BookingOutcome {
    pub fn message(&self) -> String {
        format!("Appointment booked with {}!", self.doctor_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorLoad {
    pub doctor_id: String,
    pub session_count: usize,
    pub persisted_count: usize,
}
