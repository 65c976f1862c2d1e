use chrono::{NaiveDate, Utc};
use serde_json::{json, Map};
use tracing::{debug, info};

use doctor_cell::services::DoctorDirectory;
use shared_database::{collections, Filter, SharedStore};

use crate::models::{
    serial_counter_key, Appointment, AppointmentError, AppointmentStatus,
    BookAppointmentRequest, BookingConfirmation,
};

/// Fields of a booking request that passed validation.
#[derive(Debug)]
struct ValidBooking {
    doctor_id: String,
    patient_name: String,
    patient_id: Option<String>,
    date: NaiveDate,
    time: Option<String>,
    reason: Option<String>,
}

pub struct AppointmentBookingService {
    store: SharedStore,
    doctors: DoctorDirectory,
}

impl AppointmentBookingService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            doctors: DoctorDirectory::new(store.clone()),
            store,
        }
    }

    /// Book a confirmed appointment and hand out the next serial for the
    /// doctor's day.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<BookingConfirmation, AppointmentError> {
        let booking = validate(request)?;
        info!(
            "Booking appointment with doctor {} on {} for {}",
            booking.doctor_id, booking.date, booking.patient_name
        );

        let doctor = self
            .doctors
            .find_approved(&booking.doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        if self.has_confirmed_booking(&booking).await? {
            return Err(AppointmentError::AlreadyBooked);
        }

        let serial_number = self
            .store
            .increment_counter(&serial_counter_key(&booking.doctor_id, booking.date))
            .await?;
        debug!(
            "Assigned serial {} for doctor {} on {}",
            serial_number, booking.doctor_id, booking.date
        );

        let appointment = json!({
            "doctor_id": booking.doctor_id,
            "patient_id": booking.patient_id,
            "patient_name": booking.patient_name,
            "date": booking.date,
            "time": booking.time.or_else(|| doctor.available_time.clone()),
            "reason": booking.reason,
            "status": AppointmentStatus::Confirmed,
            "serial_number": serial_number,
            "created_at": Utc::now(),
        });

        let stored = self
            .store
            .insert_one(collections::APPOINTMENTS, appointment)
            .await?;
        let appointment: Appointment = serde_json::from_value(stored)?;

        info!(
            "Appointment {} booked with serial {}",
            appointment.id, appointment.serial_number
        );

        Ok(BookingConfirmation {
            appointment_id: appointment.id.clone(),
            serial_number: appointment.serial_number,
            doctor: doctor.summary(),
            appointment,
        })
    }

    /// Cancel a confirmed appointment. Its serial is not handed out again.
    pub async fn cancel_appointment(&self, id: &str) -> Result<Appointment, AppointmentError> {
        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(AppointmentStatus::Cancelled));

        let guard = Filter::by_id(id).eq("status", AppointmentStatus::Confirmed.to_string());
        let updated = self
            .store
            .update_one(collections::APPOINTMENTS, &guard, fields)
            .await?;

        match updated {
            Some(doc) => {
                info!("Appointment {} cancelled", id);
                Ok(serde_json::from_value(doc)?)
            }
            None => {
                let current: Appointment = self
                    .store
                    .find_one_by_id(collections::APPOINTMENTS, id)
                    .await?
                    .map(serde_json::from_value::<Appointment>)
                    .transpose()?
                    .ok_or(AppointmentError::NotFound)?;
                Err(AppointmentError::InvalidStatusTransition(current.status))
            }
        }
    }

    /// Same patient is the same `patient_id` when one is given, otherwise the
    /// same patient name.
    async fn has_confirmed_booking(&self, booking: &ValidBooking) -> Result<bool, AppointmentError> {
        let filter = Filter::new()
            .eq("doctor_id", booking.doctor_id.as_str())
            .eq("date", booking.date.to_string())
            .eq("status", AppointmentStatus::Confirmed.to_string());

        let filter = match &booking.patient_id {
            Some(patient_id) => filter.eq("patient_id", patient_id.as_str()),
            None => filter.eq("patient_name", booking.patient_name.as_str()),
        };

        let existing = self.store.count(collections::APPOINTMENTS, &filter).await?;
        Ok(existing > 0)
    }
}

fn validate(request: BookAppointmentRequest) -> Result<ValidBooking, AppointmentError> {
    let doctor_id = non_blank(request.doctor_id)
        .ok_or_else(|| AppointmentError::ValidationError("doctor_id is required".to_string()))?;
    let patient_name = non_blank(request.patient_name)
        .ok_or_else(|| AppointmentError::ValidationError("patient_name is required".to_string()))?;
    let raw_date = non_blank(request.date)
        .ok_or_else(|| AppointmentError::ValidationError("date is required".to_string()))?;

    let date = NaiveDate::parse_from_str(&raw_date, "%Y-%m-%d").map_err(|_| {
        AppointmentError::ValidationError(format!("date must be YYYY-MM-DD, got '{}'", raw_date))
    })?;

    Ok(ValidBooking {
        doctor_id,
        patient_name,
        patient_id: non_blank(request.patient_id),
        date,
        time: non_blank(request.time),
        reason: non_blank(request.reason),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(doctor: &str, patient: &str, date: &str) -> BookAppointmentRequest {
        BookAppointmentRequest {
            doctor_id: Some(doctor.to_string()),
            patient_name: Some(patient.to_string()),
            date: Some(date.to_string()),
            ..BookAppointmentRequest::default()
        }
    }

    #[test]
    fn validation_requires_core_fields() {
        assert_matches!(
            validate(request("", "Alice", "2025-01-10")),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("doctor_id")
        );
        assert_matches!(
            validate(request("d1", "  ", "2025-01-10")),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("patient_name")
        );
        assert_matches!(
            validate(BookAppointmentRequest {
                date: None,
                ..request("d1", "Alice", "")
            }),
            Err(AppointmentError::ValidationError(msg)) if msg.contains("date")
        );
    }

    #[test]
    fn validation_rejects_malformed_dates() {
        assert_matches!(
            validate(request("d1", "Alice", "10/01/2025")),
            Err(AppointmentError::ValidationError(_))
        );
    }

    #[test]
    fn blank_optional_fields_are_dropped() {
        let booking = validate(BookAppointmentRequest {
            time: Some("  ".to_string()),
            reason: Some("checkup".to_string()),
            ..request("d1", " Alice ", "2025-01-10")
        })
        .unwrap();

        assert_eq!(booking.patient_name, "Alice");
        assert!(booking.time.is_none());
        assert_eq!(booking.reason.as_deref(), Some("checkup"));
    }
}
