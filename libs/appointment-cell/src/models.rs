use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use doctor_cell::models::{DoctorSummary, RegistrationError};
use patient_cell::models::{PatientSummary, UserError};
use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    pub doctor_id: String,
    pub patient_id: Option<String>,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub serial_number: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Counter document key holding the last serial handed out for a doctor's day.
pub fn serial_counter_key(doctor_id: &str, date: NaiveDate) -> String {
    format!("appointment_serial:{}:{}", doctor_id, date)
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

/// Booking form. Everything is optional here so that missing fields surface
/// as validation errors instead of body rejections.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Option<String>,
    #[serde(alias = "patientName")]
    pub patient_name: Option<String>,
    #[serde(alias = "patientId")]
    pub patient_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingConfirmation {
    pub appointment_id: String,
    pub serial_number: i64,
    pub doctor: DoctorSummary,
    pub appointment: Appointment,
}

#[derive(Debug, Clone, Serialize)]
pub struct AppointmentListing {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor: Option<DoctorSummary>,
    pub patient: Option<PatientSummary>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub doctor_id: Option<String>,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SerialReportQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SerialReportEntry {
    pub doctor_id: String,
    pub doctor: DoctorSummary,
    pub confirmed_count: u64,
    pub next_serial: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SerialReport {
    pub date: NaiveDate,
    pub doctors: Vec<SerialReportEntry>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Doctor not found or not approved")]
    DoctorNotFound,

    #[error("Appointment not found")]
    NotFound,

    #[error("No appointments found")]
    NoAppointments,

    #[error("You already have an appointment with this doctor on this date")]
    AlreadyBooked,

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidStatusTransition(AppointmentStatus),

    #[error(transparent)]
    Doctor(#[from] RegistrationError),

    #[error(transparent)]
    Patient(#[from] UserError),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Stored appointment is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::DoctorNotFound => {
                AppError::NotFound("Doctor not found or not approved".to_string())
            }
            AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
            AppointmentError::NoAppointments => {
                AppError::NotFound("No appointments found".to_string())
            }
            AppointmentError::AlreadyBooked => AppError::Conflict(
                "You already have an appointment with this doctor on this date".to_string(),
            ),
            AppointmentError::InvalidStatusTransition(status) => AppError::Conflict(format!(
                "Appointment cannot be modified in current status: {}",
                status
            )),
            AppointmentError::Doctor(e) => e.into(),
            AppointmentError::Patient(e) => e.into(),
            AppointmentError::Storage(e) => e.into(),
            AppointmentError::Malformed(e) => AppError::Database(e.to_string()),
        }
    }
}
