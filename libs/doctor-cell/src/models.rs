use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// DOCTOR REGISTRATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorRegistration {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub hospital: Option<String>,
    pub available_time: Option<String>,
    pub experience: Option<String>,
    pub license_number: Option<String>,
    pub bio: Option<String>,
    #[serde(default)]
    pub documents: Vec<DocumentRef>,
    pub status: RegistrationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DoctorRegistration {
    pub fn is_approved(&self) -> bool {
        self.status == RegistrationStatus::Approved
    }

    pub fn summary(&self) -> DoctorSummary {
        DoctorSummary {
            name: self.name.clone(),
            specialization: self.specialization.clone(),
            hospital: self.hospital.clone(),
            available_time: self.available_time.clone(),
        }
    }
}

/// What patients see about a doctor on bookings and listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoctorSummary {
    pub name: String,
    pub specialization: String,
    pub hospital: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_time: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationStatus {
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistrationStatus::Pending => write!(f, "pending"),
            RegistrationStatus::Approved => write!(f, "approved"),
            RegistrationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// A stored upload attached to a registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub field: String,
    pub file_name: String,
    pub reference: String,
}

/// Text fields of a registration form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewRegistration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub specialization: Option<String>,
    pub hospital: Option<String>,
    pub available_time: Option<String>,
    pub experience: Option<String>,
    pub license_number: Option<String>,
    pub bio: Option<String>,
}

impl NewRegistration {
    /// Assign a form field by name. Returns false for unknown fields.
    pub fn set_field(&mut self, name: &str, value: String) -> bool {
        let slot = match name {
            "name" => &mut self.name,
            "email" => &mut self.email,
            "phone" => &mut self.phone,
            "specialization" => &mut self.specialization,
            "hospital" => &mut self.hospital,
            "available_time" | "availableTime" => &mut self.available_time,
            "experience" => &mut self.experience,
            "license_number" | "licenseNumber" => &mut self.license_number,
            "bio" => &mut self.bio,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// A file part received from a multipart form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationDecision {
    pub status: RegistrationStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationListQuery {
    pub status: Option<RegistrationStatus>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Doctor registration not found")]
    NotFound,

    #[error("Doctor registration was already {0}")]
    AlreadyDecided(RegistrationStatus),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Stored registration is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<RegistrationError> for AppError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::ValidationError(msg) => AppError::ValidationError(msg),
            RegistrationError::NotFound => {
                AppError::NotFound("Doctor registration not found".to_string())
            }
            RegistrationError::AlreadyDecided(status) => {
                AppError::Conflict(format!("Doctor registration was already {}", status))
            }
            RegistrationError::Storage(e) => e.into(),
            RegistrationError::Malformed(e) => AppError::Database(e.to_string()),
        }
    }
}
