use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::Database;
use shared_models::error::AppError;

use crate::models::{
    NewRegistration, RegistrationDecision, RegistrationListQuery, UploadedFile,
};
use crate::services::{CatalogService, RegistrationService};

// ==============================================================================
// CATALOG HANDLERS
// ==============================================================================

pub async fn list_doctors(State(db): State<Database>) -> Result<Json<Value>, AppError> {
    let doctors = CatalogService::new(db.documents).list_doctors().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

pub async fn get_doctor(
    State(db): State<Database>,
    Path(doctor_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let doctor = CatalogService::new(db.documents)
        .get_doctor(&doctor_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Doctor not found".to_string()))?;

    Ok(Json(doctor))
}

pub async fn list_services(State(db): State<Database>) -> Result<Json<Value>, AppError> {
    let services = CatalogService::new(db.documents).list_services().await?;

    Ok(Json(json!({
        "services": services,
        "total": services.len()
    })))
}

pub async fn get_service(
    State(db): State<Database>,
    Path(service_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let service = CatalogService::new(db.documents)
        .get_service(&service_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Service not found".to_string()))?;

    Ok(Json(service))
}

// ==============================================================================
// DOCTOR REGISTRATION HANDLERS
// ==============================================================================

/// Multipart registration form: text fields plus any number of file parts.
pub async fn submit_registration(
    State(db): State<Database>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut form = NewRegistration::default();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file '{}': {}", name, e)))?;

            files.push(UploadedFile {
                field: name,
                file_name,
                content_type,
                data,
            });
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read field '{}': {}", name, e)))?;

            if !form.set_field(&name, value) {
                debug!("Ignoring unknown registration field '{}'", name);
            }
        }
    }

    info!("Doctor registration received with {} file(s)", files.len());
    let registration = RegistrationService::new(&db).submit(form, files).await?;

    Ok(Json(json!({
        "success": true,
        "registration": registration,
        "message": "Registration submitted and pending review"
    })))
}

pub async fn list_registrations(
    State(db): State<Database>,
    Query(query): Query<RegistrationListQuery>,
) -> Result<Json<Value>, AppError> {
    let registrations = RegistrationService::new(&db).list(query.status).await?;

    Ok(Json(json!({
        "registrations": registrations,
        "total": registrations.len()
    })))
}

pub async fn get_registration(
    State(db): State<Database>,
    Path(registration_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let registration = RegistrationService::new(&db).get(&registration_id).await?;
    Ok(Json(json!(registration)))
}

pub async fn decide_registration(
    State(db): State<Database>,
    Path(registration_id): Path<String>,
    Json(decision): Json<RegistrationDecision>,
) -> Result<Json<Value>, AppError> {
    let registration = RegistrationService::new(&db)
        .decide(&registration_id, decision.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "registration": registration,
        "message": format!("Registration {}", registration.status)
    })))
}

pub async fn delete_registration(
    State(db): State<Database>,
    Path(registration_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    RegistrationService::new(&db).delete(&registration_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Registration deleted"
    })))
}
