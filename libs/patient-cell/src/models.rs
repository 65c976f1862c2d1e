use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_database::StoreError;
use shared_models::error::AppError;

// ==============================================================================
// USER MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn summary(&self) -> PatientSummary {
        PatientSummary {
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// Contact details shown next to an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientSummary {
    pub name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User not found")]
    NotFound,

    #[error("User with email {0} already exists")]
    AlreadyExists(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("Stored user is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::ValidationError(msg) => AppError::ValidationError(msg),
            UserError::NotFound => AppError::NotFound("User not found".to_string()),
            UserError::AlreadyExists(email) => {
                AppError::Conflict(format!("User with email {} already exists", email))
            }
            UserError::Storage(e) => e.into(),
            UserError::Malformed(e) => AppError::Database(e.to_string()),
        }
    }
}

// ==============================================================================
// CART MODELS
// ==============================================================================

/// Fields a cart item update may set. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CartUpdate {
    pub service: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CartUpdate {
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.date.is_none()
            && self.time.is_none()
            && self.name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CartUserQuery {
    #[serde(rename = "userEmail", alias = "user_email")]
    pub user_email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum CartError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cart item not found")]
    NotFound,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ValidationError(msg) => AppError::ValidationError(msg),
            CartError::NotFound => AppError::NotFound("Cart item not found".to_string()),
            CartError::Storage(e) => e.into(),
        }
    }
}
