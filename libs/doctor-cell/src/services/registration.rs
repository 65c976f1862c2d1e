use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_database::{
    collections, Database, Filter, FindOptions, SharedObjectStore, SharedStore,
};

use crate::models::{
    DocumentRef, DoctorRegistration, NewRegistration, RegistrationError, RegistrationStatus,
    UploadedFile,
};

pub struct RegistrationService {
    store: SharedStore,
    objects: SharedObjectStore,
}

impl RegistrationService {
    pub fn new(db: &Database) -> Self {
        Self {
            store: db.documents.clone(),
            objects: db.objects.clone(),
        }
    }

    /// Store the uploaded documents and create a pending registration.
    pub async fn submit(
        &self,
        form: NewRegistration,
        files: Vec<UploadedFile>,
    ) -> Result<DoctorRegistration, RegistrationError> {
        let name = required(form.name, "name")?;
        let email = required(form.email, "email")?;
        let specialization = required(form.specialization, "specialization")?;

        let id = Uuid::new_v4().to_string();
        debug!("Submitting doctor registration {} for {}", id, email);

        let mut documents = Vec::with_capacity(files.len());
        for file in files {
            let path = format!("{}/{}-{}", id, file.field, sanitize_file_name(&file.file_name));
            let reference = match self
                .objects
                .put_object(&path, &file.content_type, file.data)
                .await
            {
                Ok(reference) => reference,
                Err(e) => {
                    self.discard_documents(&documents).await;
                    return Err(e.into());
                }
            };
            documents.push(DocumentRef {
                field: file.field,
                file_name: file.file_name,
                reference,
            });
        }

        let now = Utc::now();
        let registration = DoctorRegistration {
            id,
            name,
            email,
            phone: form.phone,
            specialization,
            hospital: form.hospital,
            available_time: form.available_time,
            experience: form.experience,
            license_number: form.license_number,
            bio: form.bio,
            documents,
            status: RegistrationStatus::Pending,
            created_at: now,
            updated_at: now,
        };

        let stored = match self.insert_registration(&registration).await {
            Ok(stored) => stored,
            Err(e) => {
                self.discard_documents(&registration.documents).await;
                return Err(e);
            }
        };

        info!("Doctor registration {} submitted", registration.id);
        Ok(serde_json::from_value(stored)?)
    }

    async fn insert_registration(
        &self,
        registration: &DoctorRegistration,
    ) -> Result<Value, RegistrationError> {
        let doc = serde_json::to_value(registration)?;
        Ok(self
            .store
            .insert_one(collections::DOCTOR_REGISTRATIONS, doc)
            .await?)
    }

    /// Best-effort removal of uploads whose registration was never stored.
    async fn discard_documents(&self, documents: &[DocumentRef]) {
        for document in documents {
            if let Err(e) = self.objects.delete_object(&document.reference).await {
                warn!("Failed to remove orphaned upload {}: {}", document.reference, e);
            }
        }
    }

    pub async fn list(
        &self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<DoctorRegistration>, RegistrationError> {
        let filter = match status {
            Some(status) => Filter::new().eq("status", status.to_string()),
            None => Filter::new(),
        };

        let docs = self
            .store
            .find(
                collections::DOCTOR_REGISTRATIONS,
                &filter,
                FindOptions::new().sort_desc("created_at"),
            )
            .await?;

        docs.into_iter()
            .map(|doc| serde_json::from_value(doc).map_err(RegistrationError::from))
            .collect()
    }

    pub async fn get(&self, id: &str) -> Result<DoctorRegistration, RegistrationError> {
        let doc = self
            .store
            .find_one_by_id(collections::DOCTOR_REGISTRATIONS, id)
            .await?
            .ok_or(RegistrationError::NotFound)?;
        Ok(serde_json::from_value(doc)?)
    }

    /// Approve or reject a pending registration. Only the first decision sticks.
    pub async fn decide(
        &self,
        id: &str,
        decision: RegistrationStatus,
    ) -> Result<DoctorRegistration, RegistrationError> {
        if decision == RegistrationStatus::Pending {
            return Err(RegistrationError::ValidationError(
                "status must be 'approved' or 'rejected'".to_string(),
            ));
        }

        let mut fields = Map::new();
        fields.insert("status".to_string(), json!(decision));
        fields.insert("updated_at".to_string(), json!(Utc::now()));

        let guard = Filter::by_id(id).eq("status", RegistrationStatus::Pending.to_string());
        let updated = self
            .store
            .update_one(collections::DOCTOR_REGISTRATIONS, &guard, fields)
            .await?;

        match updated {
            Some(doc) => {
                info!("Doctor registration {} {}", id, decision);
                Ok(serde_json::from_value(doc)?)
            }
            None => {
                // Either missing or already decided
                let current = self.get(id).await?;
                Err(RegistrationError::AlreadyDecided(current.status))
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), RegistrationError> {
        if self
            .store
            .delete_one(collections::DOCTOR_REGISTRATIONS, id)
            .await?
        {
            info!("Doctor registration {} deleted", id);
            Ok(())
        } else {
            Err(RegistrationError::NotFound)
        }
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, RegistrationError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RegistrationError::ValidationError(format!("{} is required", field)))
}

/// Keep only characters that are safe in a storage path segment.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.trim_matches('.').is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("my license.pdf"), "my_license.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_file_name(".."), "upload");
    }

    #[test]
    fn required_fields_are_trimmed() {
        assert_eq!(required(Some("  Ann ".into()), "name").unwrap(), "Ann");
        assert!(required(Some("   ".into()), "name").is_err());
        assert!(required(None, "name").is_err());
    }
}
