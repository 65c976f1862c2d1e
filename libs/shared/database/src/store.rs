use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::filter::{Filter, FindOptions, GroupCount};

/// Collection-oriented document storage.
///
/// Documents are JSON objects carrying a string-representable `id`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Value>, StoreError>;

    async fn find_one_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    /// Stores the document, assigning an `id` when it has none, and returns it.
    async fn insert_one(&self, collection: &str, document: Value) -> Result<Value, StoreError>;

    /// Sets `fields` on the first document matching `filter`.
    ///
    /// Returns `None` when nothing matched, which lets callers express
    /// conditional updates through guard clauses in the filter.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError>;

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StoreError>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError>;

    async fn aggregate_group_count(
        &self,
        collection: &str,
        filter: &Filter,
        group_by: &str,
    ) -> Result<Vec<GroupCount>, StoreError>;

    /// Atomically increments the named counter and returns the new value.
    /// The first call for a key returns 1.
    async fn increment_counter(&self, key: &str) -> Result<i64, StoreError>;

    /// Current value of the named counter without advancing it; 0 if unused.
    async fn current_counter(&self, key: &str) -> Result<i64, StoreError>;
}

/// Blob storage for uploaded files.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores the bytes and returns an opaque reference to them.
    async fn put_object(
        &self,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StoreError>;

    /// Removes an object by the reference `put_object` returned.
    async fn delete_object(&self, reference: &str) -> Result<(), StoreError>;
}
