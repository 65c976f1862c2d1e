use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use tracing::debug;

use doctor_cell::services::DoctorDirectory;
use shared_database::{collections, Filter, SharedStore};

use crate::models::{
    serial_counter_key, AppointmentError, AppointmentStatus, SerialReport, SerialReportEntry,
};

/// Read-only daily report of how far each approved doctor's queue has gone.
/// Never part of the booking path.
pub struct SerialReportService {
    store: SharedStore,
    doctors: DoctorDirectory,
}

impl SerialReportService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            doctors: DoctorDirectory::new(store.clone()),
            store,
        }
    }

    pub async fn daily_report(&self, date: Option<NaiveDate>) -> Result<SerialReport, AppointmentError> {
        let date = date.unwrap_or_else(|| Utc::now().date_naive());

        let filter = Filter::new()
            .eq("date", date.to_string())
            .eq("status", AppointmentStatus::Confirmed.to_string());
        let groups = self
            .store
            .aggregate_group_count(collections::APPOINTMENTS, &filter, "doctor_id")
            .await?;

        let counts: HashMap<String, u64> = groups
            .into_iter()
            .filter_map(|group| match group.key {
                Value::String(id) => Some((id, group.count)),
                Value::Number(n) => Some((n.to_string(), group.count)),
                _ => None,
            })
            .collect();

        let mut doctors = Vec::new();
        for doctor in self.doctors.list_approved().await? {
            let confirmed_count = counts.get(&doctor.id).copied().unwrap_or(0);
            // Serials follow the booking counter, which cancellations never rewind
            let issued = self
                .store
                .current_counter(&serial_counter_key(&doctor.id, date))
                .await?;
            doctors.push(SerialReportEntry {
                doctor_id: doctor.id.clone(),
                doctor: doctor.summary(),
                confirmed_count,
                next_serial: u64::try_from(issued).unwrap_or(0) + 1,
            });
        }

        debug!("Serial report for {} covers {} doctors", date, doctors.len());
        Ok(SerialReport { date, doctors })
    }
}
