use axum::{routing::get, Router};

use appointment_cell::router::appointment_routes;
use chat_cell::{chat_routes, ChatState, PresenceRegistry};
use doctor_cell::router::doctor_routes;
use patient_cell::router::patient_routes;
use shared_database::Database;

pub fn create_router(db: Database, presence: PresenceRegistry) -> Router {
    Router::new()
        .route("/", get(|| async { "Madical" }))
        .merge(doctor_routes(db.clone()))
        .merge(appointment_routes(db.clone()))
        .merge(patient_routes(db.clone()))
        .merge(chat_routes(ChatState::new(db, presence)))
}
