use tracing::{debug, warn};

use shared_database::{collections, Filter, FindOptions, SharedStore};

use crate::models::{DoctorRegistration, RegistrationError, RegistrationStatus};

/// Lookup of registered doctors for other cells (booking, listings).
#[derive(Clone)]
pub struct DoctorDirectory {
    store: SharedStore,
}

impl DoctorDirectory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn find(&self, doctor_id: &str) -> Result<Option<DoctorRegistration>, RegistrationError> {
        let doc = self
            .store
            .find_one_by_id(collections::DOCTOR_REGISTRATIONS, doctor_id)
            .await?;

        match doc {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// The doctor, only if its registration has been approved.
    pub async fn find_approved(
        &self,
        doctor_id: &str,
    ) -> Result<Option<DoctorRegistration>, RegistrationError> {
        let doctor = self.find(doctor_id).await?;
        if let Some(ref d) = doctor {
            if !d.is_approved() {
                debug!("Doctor {} is {}, not bookable", doctor_id, d.status);
            }
        }
        Ok(doctor.filter(DoctorRegistration::is_approved))
    }

    pub async fn list_approved(&self) -> Result<Vec<DoctorRegistration>, RegistrationError> {
        let docs = self
            .store
            .find(
                collections::DOCTOR_REGISTRATIONS,
                &Filter::new().eq("status", RegistrationStatus::Approved.to_string()),
                FindOptions::new().sort_asc("name"),
            )
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(doctor) => Some(doctor),
                Err(e) => {
                    warn!("Skipping malformed doctor registration: {}", e);
                    None
                }
            })
            .collect())
    }
}
