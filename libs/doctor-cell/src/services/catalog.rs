use serde_json::Value;
use tracing::debug;

use shared_database::{collections, Filter, FindOptions, SharedStore, StoreError};

/// Read-only doctor and service catalogs. Catalog documents are imported
/// as-is, so they are passed through without a fixed schema.
pub struct CatalogService {
    store: SharedStore,
}

impl CatalogService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list_doctors(&self) -> Result<Vec<Value>, StoreError> {
        debug!("Listing doctor catalog");
        self.store
            .find(collections::DOCTORS, &Filter::new(), FindOptions::new())
            .await
    }

    pub async fn get_doctor(&self, id: &str) -> Result<Option<Value>, StoreError> {
        self.store.find_one_by_id(collections::DOCTORS, id).await
    }

    pub async fn list_services(&self) -> Result<Vec<Value>, StoreError> {
        debug!("Listing services catalog");
        self.store
            .find(collections::SERVICES, &Filter::new(), FindOptions::new())
            .await
    }

    pub async fn get_service(&self, id: &str) -> Result<Option<Value>, StoreError> {
        self.store.find_one_by_id(collections::SERVICES, id).await
    }
}
