use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use shared_database::Database;
use shared_models::error::AppError;

use crate::models::{CartUpdate, CartUserQuery, CreateUserRequest};
use crate::services::{CartService, UserService};

// ==============================================================================
// USER HANDLERS
// ==============================================================================

pub async fn create_user(
    State(db): State<Database>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(db.documents).create(request).await?;
    Ok(Json(json!(user)))
}

pub async fn list_users(State(db): State<Database>) -> Result<Json<Value>, AppError> {
    let users = UserService::new(db.documents).list().await?;

    Ok(Json(json!({
        "users": users,
        "total": users.len()
    })))
}

pub async fn get_user(
    State(db): State<Database>,
    Path(user_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let user = UserService::new(db.documents).get(&user_id).await?;
    Ok(Json(json!(user)))
}

// ==============================================================================
// CART HANDLERS
// ==============================================================================

pub async fn list_cart(State(db): State<Database>) -> Result<Json<Value>, AppError> {
    let items = CartService::new(db.documents).list().await?;
    Ok(Json(json!(items)))
}

pub async fn list_cart_for_user(
    State(db): State<Database>,
    Query(query): Query<CartUserQuery>,
) -> Result<Json<Value>, AppError> {
    let items = CartService::new(db.documents)
        .list_for_email(&query.user_email)
        .await?;
    Ok(Json(json!(items)))
}

pub async fn add_cart_item(
    State(db): State<Database>,
    Json(item): Json<Value>,
) -> Result<Json<Value>, AppError> {
    let stored = CartService::new(db.documents).add(item).await?;

    Ok(Json(json!({
        "success": true,
        "inserted_id": stored["id"],
        "item": stored
    })))
}

pub async fn get_cart_item(
    State(db): State<Database>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let item = CartService::new(db.documents).get(&item_id).await?;
    Ok(Json(item))
}

pub async fn update_cart_item(
    State(db): State<Database>,
    Path(item_id): Path<String>,
    Json(update): Json<CartUpdate>,
) -> Result<Json<Value>, AppError> {
    let item = CartService::new(db.documents)
        .update(&item_id, update)
        .await?;

    Ok(Json(json!({
        "success": true,
        "item": item
    })))
}

pub async fn delete_cart_item(
    State(db): State<Database>,
    Path(item_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    CartService::new(db.documents).remove(&item_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Cart item deleted"
    })))
}
