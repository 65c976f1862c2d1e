use serde_json::{Map, Value};
use tracing::{debug, info};

use shared_database::{collections, Filter, FindOptions, SharedStore};

use crate::models::{CartError, CartUpdate};

/// Columns of the cart table. Any other submitted key is kept under `data`.
const CART_COLUMNS: [&str; 8] = [
    "id", "service", "date", "time", "name", "phone", "email", "created_at",
];
const EXTRA_FIELDS: &str = "data";

/// Splits a submitted item into column fields plus a `data` object of extras.
fn to_stored(item: Map<String, Value>) -> Value {
    let (columns, extras): (Map<String, Value>, Map<String, Value>) = item
        .into_iter()
        .partition(|(key, _)| CART_COLUMNS.contains(&key.as_str()));

    let mut stored = columns;
    stored.insert(EXTRA_FIELDS.to_string(), Value::Object(extras));
    Value::Object(stored)
}

/// Lifts the extras back to the top level, as they were submitted.
fn from_stored(mut stored: Value) -> Value {
    if let Some(object) = stored.as_object_mut() {
        if let Some(Value::Object(extras)) = object.remove(EXTRA_FIELDS) {
            for (key, value) in extras {
                object.entry(key).or_insert(value);
            }
        }
    }
    stored
}

/// Pending service applications ("my cart"). Items come back as submitted.
pub struct CartService {
    store: SharedStore,
}

impl CartService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Value>, CartError> {
        let items = self
            .store
            .find(collections::CART_ITEMS, &Filter::new(), FindOptions::new())
            .await?;
        Ok(items.into_iter().map(from_stored).collect())
    }

    pub async fn list_for_email(&self, email: &str) -> Result<Vec<Value>, CartError> {
        debug!("Listing cart items for {}", email);
        let items = self
            .store
            .find(
                collections::CART_ITEMS,
                &Filter::new().eq("email", email),
                FindOptions::new(),
            )
            .await?;
        Ok(items.into_iter().map(from_stored).collect())
    }

    pub async fn add(&self, item: Value) -> Result<Value, CartError> {
        let Value::Object(item) = item else {
            return Err(CartError::ValidationError(
                "cart item must be a JSON object".to_string(),
            ));
        };

        let stored = self
            .store
            .insert_one(collections::CART_ITEMS, to_stored(item))
            .await?;
        info!("Cart item {} added", stored["id"]);
        Ok(from_stored(stored))
    }

    pub async fn get(&self, id: &str) -> Result<Value, CartError> {
        self.store
            .find_one_by_id(collections::CART_ITEMS, id)
            .await?
            .map(from_stored)
            .ok_or(CartError::NotFound)
    }

    pub async fn update(&self, id: &str, update: CartUpdate) -> Result<Value, CartError> {
        if update.is_empty() {
            return Err(CartError::ValidationError("nothing to update".to_string()));
        }

        let mut fields = Map::new();
        let pairs = [
            ("service", update.service),
            ("date", update.date),
            ("time", update.time),
            ("name", update.name),
            ("phone", update.phone),
            ("email", update.email),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                fields.insert(key.to_string(), Value::String(value));
            }
        }

        self.store
            .update_one(collections::CART_ITEMS, &Filter::by_id(id), fields)
            .await?
            .map(from_stored)
            .ok_or(CartError::NotFound)
    }

    pub async fn remove(&self, id: &str) -> Result<(), CartError> {
        if self.store.delete_one(collections::CART_ITEMS, id).await? {
            info!("Cart item {} removed", id);
            Ok(())
        } else {
            Err(CartError::NotFound)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extras_are_nested_for_storage_and_lifted_back() {
        let Value::Object(item) = json!({
            "service": "Dental",
            "userEmail": "a@b.c",
            "price": 500
        }) else {
            unreachable!()
        };

        let stored = to_stored(item);
        assert_eq!(stored["service"], "Dental");
        assert_eq!(stored["data"], json!({ "userEmail": "a@b.c", "price": 500 }));
        assert!(stored.get("price").is_none());

        let read = from_stored(stored);
        assert_eq!(read, json!({ "service": "Dental", "userEmail": "a@b.c", "price": 500 }));
    }
}
