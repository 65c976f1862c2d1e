use axum::{
    routing::{get, patch, post},
    Router,
};

use shared_database::Database;

use crate::handlers;

pub fn appointment_routes(db: Database) -> Router {
    Router::new()
        .route("/appointments", post(handlers::book_appointment))
        .route("/appointments-list", get(handlers::list_appointments))
        .route("/appointments/serial-report", get(handlers::serial_report))
        .route(
            "/appointments/{appointment_id}/cancel",
            patch(handlers::cancel_appointment),
        )
        .with_state(db)
}
