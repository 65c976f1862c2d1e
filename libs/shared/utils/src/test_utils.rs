use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request},
    response::Response,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{collections, Database, DocumentStore, MemoryStore};

pub struct TestConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            supabase_url: "http://localhost:54321".to_string(),
            supabase_anon_key: "test-anon-key".to_string(),
        }
    }
}

impl TestConfig {
    /// Config pointing at a mock PostgREST server.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            supabase_url: url.into(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            supabase_url: self.supabase_url.clone(),
            supabase_anon_key: self.supabase_anon_key.clone(),
            ..AppConfig::default()
        }
    }
}

/// A fresh in-memory database plus a typed handle on the backing store.
pub fn memory_database() -> (Database, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let database = Database {
        documents: store.clone(),
        objects: store.clone(),
    };
    (database, store)
}

pub struct DoctorFixture<'a> {
    pub name: &'a str,
    pub specialization: &'a str,
    pub hospital: &'a str,
    pub available_time: &'a str,
    pub status: &'a str,
}

impl Default for DoctorFixture<'_> {
    fn default() -> Self {
        Self {
            name: "Dr. Test",
            specialization: "General Practice",
            hospital: "City Hospital",
            available_time: "10:00",
            status: "approved",
        }
    }
}

pub struct MockSupabaseResponses;

impl MockSupabaseResponses {
    pub fn doctor_registration_response(id: &str, fixture: &DoctorFixture<'_>) -> Value {
        json!({
            "id": id,
            "name": fixture.name,
            "email": format!("{}@example.com", id),
            "phone": "555-0100",
            "specialization": fixture.specialization,
            "hospital": fixture.hospital,
            "available_time": fixture.available_time,
            "experience": "10 years",
            "license_number": "MD123456",
            "bio": null,
            "documents": [],
            "status": fixture.status,
            "created_at": "2024-01-01T00:00:00Z",
            "updated_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn user_response(id: &str, name: &str) -> Value {
        json!({
            "id": id,
            "name": name,
            "email": format!("{}@example.com", name.to_lowercase()),
            "phone": "555-0199",
            "created_at": "2024-01-01T00:00:00Z"
        })
    }

    pub fn appointment_response(id: &str, doctor_id: &str, patient_name: &str, serial: i64) -> Value {
        json!({
            "id": id,
            "doctor_id": doctor_id,
            "patient_id": null,
            "patient_name": patient_name,
            "date": "2025-01-10",
            "time": "10:00",
            "reason": null,
            "status": "confirmed",
            "serial_number": serial,
            "created_at": "2025-01-01T00:00:00Z"
        })
    }
}

pub async fn seed_doctor(store: &dyn DocumentStore, fixture: DoctorFixture<'_>) -> String {
    let id = Uuid::new_v4().to_string();
    let mut doc = MockSupabaseResponses::doctor_registration_response(&id, &fixture);
    doc["created_at"] = json!(Utc::now());
    doc["updated_at"] = json!(Utc::now());
    store
        .insert_one(collections::DOCTOR_REGISTRATIONS, doc)
        .await
        .expect("seed doctor");
    id
}

pub async fn seed_approved_doctor(store: &dyn DocumentStore, name: &str, available_time: &str) -> String {
    seed_doctor(
        store,
        DoctorFixture {
            name,
            available_time,
            ..DoctorFixture::default()
        },
    )
    .await
}

pub async fn seed_user(store: &dyn DocumentStore, name: &str) -> String {
    let id = Uuid::new_v4().to_string();
    store
        .insert_one(collections::USERS, MockSupabaseResponses::user_response(&id, name))
        .await
        .expect("seed user");
    id
}

pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("valid request")
}

pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("valid request")
}

pub async fn read_json(response: Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    serde_json::from_slice(&body).expect("json body")
}
