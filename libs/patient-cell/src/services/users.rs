use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

use shared_database::{collections, Filter, FindOptions, SharedStore};

use crate::models::{CreateUserRequest, User, UserError};

/// Registered users; also the patient directory other cells resolve ids against.
#[derive(Clone)]
pub struct UserService {
    store: SharedStore,
}

impl UserService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateUserRequest) -> Result<User, UserError> {
        let email = request
            .email
            .map(|e| e.trim().to_lowercase())
            .filter(|e| !e.is_empty())
            .ok_or_else(|| UserError::ValidationError("email is required".to_string()))?;

        let existing = self
            .store
            .count(collections::USERS, &Filter::new().eq("email", email.as_str()))
            .await?;
        if existing > 0 {
            return Err(UserError::AlreadyExists(email));
        }

        let doc = json!({
            "name": request.name,
            "email": email,
            "phone": request.phone,
            "created_at": Utc::now(),
        });

        let stored = self.store.insert_one(collections::USERS, doc).await?;
        let user: User = serde_json::from_value(stored)?;

        info!("User {} created", user.id);
        Ok(user)
    }

    pub async fn list(&self) -> Result<Vec<User>, UserError> {
        let docs = self
            .store
            .find(
                collections::USERS,
                &Filter::new(),
                FindOptions::new().sort_desc("created_at"),
            )
            .await?;

        Ok(docs
            .into_iter()
            .filter_map(|doc| match serde_json::from_value(doc) {
                Ok(user) => Some(user),
                Err(e) => {
                    warn!("Skipping malformed user: {}", e);
                    None
                }
            })
            .collect())
    }

    pub async fn find(&self, id: &str) -> Result<Option<User>, UserError> {
        debug!("Looking up user {}", id);
        match self.store.find_one_by_id(collections::USERS, id).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn get(&self, id: &str) -> Result<User, UserError> {
        self.find(id).await?.ok_or(UserError::NotFound)
    }
}
