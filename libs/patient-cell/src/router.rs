use axum::{
    routing::{get, post},
    Router,
};

use shared_database::Database;

use crate::handlers::*;

pub fn patient_routes(db: Database) -> Router {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/{id}", get(get_user))
        .route("/mycart", get(list_cart).post(add_cart_item))
        .route("/mycart/user", get(list_cart_for_user))
        .route(
            "/mycart/{id}",
            get(get_cart_item)
                .patch(update_cart_item)
                .delete(delete_cart_item),
        )
        .with_state(db)
}
