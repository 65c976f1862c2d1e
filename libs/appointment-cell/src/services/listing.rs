use std::collections::HashMap;

use tracing::{debug, warn};

use doctor_cell::models::{DoctorSummary, RegistrationError};
use doctor_cell::services::DoctorDirectory;
use patient_cell::models::{PatientSummary, UserError};
use patient_cell::services::UserService;
use shared_database::{collections, Filter, FindOptions, SharedStore};

use crate::models::{Appointment, AppointmentError, AppointmentListQuery, AppointmentListing};

pub struct AppointmentListingService {
    store: SharedStore,
    doctors: DoctorDirectory,
    users: UserService,
}

impl AppointmentListingService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            doctors: DoctorDirectory::new(store.clone()),
            users: UserService::new(store.clone()),
            store,
        }
    }

    /// Appointments newest first, each with doctor and patient summaries.
    /// Unknown references resolve to `None`.
    pub async fn list_appointments(
        &self,
        query: AppointmentListQuery,
    ) -> Result<Vec<AppointmentListing>, AppointmentError> {
        let mut filter = Filter::new();
        if let Some(doctor_id) = query.doctor_id {
            filter = filter.eq("doctor_id", doctor_id);
        }
        if let Some(date) = query.date {
            filter = filter.eq("date", date.to_string());
        }

        let docs = self
            .store
            .find(
                collections::APPOINTMENTS,
                &filter,
                FindOptions::new().sort_desc("created_at"),
            )
            .await?;

        if docs.is_empty() {
            return Err(AppointmentError::NoAppointments);
        }

        let mut doctor_cache: HashMap<String, Option<DoctorSummary>> = HashMap::new();
        let mut patient_cache: HashMap<String, Option<PatientSummary>> = HashMap::new();
        let mut listings = Vec::with_capacity(docs.len());

        for doc in docs {
            let appointment: Appointment = match serde_json::from_value(doc) {
                Ok(appointment) => appointment,
                Err(e) => {
                    warn!("Skipping malformed appointment: {}", e);
                    continue;
                }
            };

            let doctor = match doctor_cache.get(&appointment.doctor_id) {
                Some(cached) => cached.clone(),
                None => {
                    let summary = self.doctor_summary(&appointment.doctor_id).await?;
                    doctor_cache.insert(appointment.doctor_id.clone(), summary.clone());
                    summary
                }
            };

            let patient = match &appointment.patient_id {
                Some(patient_id) => match patient_cache.get(patient_id) {
                    Some(cached) => cached.clone(),
                    None => {
                        let summary = self.patient_summary(patient_id).await?;
                        patient_cache.insert(patient_id.clone(), summary.clone());
                        summary
                    }
                },
                None => None,
            };

            listings.push(AppointmentListing {
                appointment,
                doctor,
                patient,
            });
        }

        if listings.is_empty() {
            return Err(AppointmentError::NoAppointments);
        }

        debug!("Listed {} appointments", listings.len());
        Ok(listings)
    }

    async fn doctor_summary(&self, doctor_id: &str) -> Result<Option<DoctorSummary>, AppointmentError> {
        match self.doctors.find(doctor_id).await {
            Ok(doctor) => Ok(doctor.map(|d| DoctorSummary {
                available_time: None,
                ..d.summary()
            })),
            Err(RegistrationError::Malformed(e)) => {
                warn!("Doctor {} is malformed: {}", doctor_id, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn patient_summary(&self, patient_id: &str) -> Result<Option<PatientSummary>, AppointmentError> {
        match self.users.find(patient_id).await {
            Ok(user) => Ok(user.map(|u| u.summary())),
            Err(UserError::Malformed(e)) => {
                warn!("Patient {} is malformed: {}", patient_id, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
