use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::Database;
use shared_models::error::AppError;

use crate::models::{AppointmentListQuery, BookAppointmentRequest, SerialReportQuery};
use crate::services::{
    AppointmentBookingService, AppointmentListingService, SerialReportService,
};

pub async fn book_appointment(
    State(db): State<Database>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let confirmation = AppointmentBookingService::new(db.documents)
        .book_appointment(request)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment booked successfully",
        "appointment_id": confirmation.appointment_id,
        "serial_number": confirmation.serial_number,
        "doctor": confirmation.doctor,
        "appointment": confirmation.appointment
    })))
}

pub async fn list_appointments(
    State(db): State<Database>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = AppointmentListingService::new(db.documents)
        .list_appointments(query)
        .await?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

pub async fn cancel_appointment(
    State(db): State<Database>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let appointment = AppointmentBookingService::new(db.documents)
        .cancel_appointment(&appointment_id)
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment cancelled",
        "appointment": appointment
    })))
}

pub async fn serial_report(
    State(db): State<Database>,
    Query(query): Query<SerialReportQuery>,
) -> Result<Json<Value>, AppError> {
    let report = SerialReportService::new(db.documents)
        .daily_report(query.date)
        .await?;

    Ok(Json(json!(report)))
}
