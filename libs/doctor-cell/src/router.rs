use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch},
    Router,
};

use shared_database::Database;

use crate::handlers;

/// Upper bound for a registration form including its documents.
const REGISTRATION_BODY_LIMIT: usize = 20 * 1024 * 1024;

pub fn doctor_routes(db: Database) -> Router {
    let catalog_routes = Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/doctors/{doctor_id}", get(handlers::get_doctor))
        .route("/service", get(handlers::list_services))
        .route("/service/{service_id}", get(handlers::get_service));

    let registration_routes = Router::new()
        .route(
            "/doctor-registrations",
            get(handlers::list_registrations).post(handlers::submit_registration)
                .layer(DefaultBodyLimit::max(REGISTRATION_BODY_LIMIT)),
        )
        .route(
            "/doctor-registrations/{registration_id}",
            get(handlers::get_registration).delete(handlers::delete_registration),
        )
        .route(
            "/doctor-registrations/{registration_id}/status",
            patch(handlers::decide_registration),
        );

    Router::new()
        .merge(catalog_routes)
        .merge(registration_routes)
        .with_state(db)
}
