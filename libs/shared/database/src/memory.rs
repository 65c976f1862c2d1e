use std::collections::HashMap;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use tokio::sync::{Mutex, RwLock};
use tracing::debug;
use uuid::Uuid;

use crate::error::StoreError;
use crate::filter::{loosely_equal, Filter, FindOptions, GroupCount, SortOrder};
use crate::store::{DocumentStore, ObjectStore};

struct StoredObject {
    content_type: String,
    data: Bytes,
}

/// Process-local store. Collections keep insertion order, which is also the
/// tie-breaker when sort keys compare equal.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Value>>>,
    counters: Mutex<HashMap<String, i64>>,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Content type and bytes of a stored object, by the reference `put_object` returned.
    pub async fn object(&self, reference: &str) -> Option<(String, Bytes)> {
        let objects = self.objects.read().await;
        objects
            .get(reference)
            .map(|o| (o.content_type.clone(), o.data.clone()))
    }
}

fn has_id(document: &Value, id: &str) -> bool {
    document
        .get("id")
        .map(|v| loosely_equal(v, &json!(id)))
        .unwrap_or(false)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<(usize, &Value)> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.matches(doc))
            .collect();

        if !options.sort.is_empty() {
            // Ties follow insertion order in the direction of the primary key
            let newest_first = options.sort[0].1 == SortOrder::Desc;
            matched.sort_by(|(ia, a), (ib, b)| {
                options.compare(a, b).then_with(|| {
                    if newest_first {
                        ib.cmp(ia)
                    } else {
                        ia.cmp(ib)
                    }
                })
            });
        }

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = options.limit.map(|l| l as usize).unwrap_or(usize::MAX);

        Ok(matched
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|(_, doc)| doc.clone())
            .collect())
    }

    async fn find_one_by_id(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)))
            .cloned())
    }

    async fn insert_one(&self, collection: &str, mut document: Value) -> Result<Value, StoreError> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;
        object
            .entry("id")
            .or_insert_with(|| json!(Uuid::new_v4().to_string()));

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());

        debug!("Inserted document into {}", collection);
        Ok(document)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        fields: Map<String, Value>,
    ) -> Result<Option<Value>, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(None);
        };

        let Some(document) = documents.iter_mut().find(|doc| filter.matches(doc)) else {
            return Ok(None);
        };

        if let Some(object) = document.as_object_mut() {
            for (key, value) in fields {
                object.insert(key, value);
            }
        }

        Ok(Some(document.clone()))
    }

    async fn delete_one(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(false);
        };

        match documents.iter().position(|doc| has_id(doc, id)) {
            Some(index) => {
                documents.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).count() as u64)
            .unwrap_or(0))
    }

    async fn aggregate_group_count(
        &self,
        collection: &str,
        filter: &Filter,
        group_by: &str,
    ) -> Result<Vec<GroupCount>, StoreError> {
        let collections = self.collections.read().await;
        let mut groups: Vec<GroupCount> = Vec::new();

        for doc in collections
            .get(collection)
            .into_iter()
            .flatten()
            .filter(|doc| filter.matches(doc))
        {
            let key = doc.get(group_by).cloned().unwrap_or(Value::Null);
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.count += 1,
                None => groups.push(GroupCount { key, count: 1 }),
            }
        }

        Ok(groups)
    }

    async fn increment_counter(&self, key: &str) -> Result<i64, StoreError> {
        let mut counters = self.counters.lock().await;
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }

    async fn current_counter(&self, key: &str) -> Result<i64, StoreError> {
        Ok(self.counters.lock().await.get(key).copied().unwrap_or(0))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        path: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<String, StoreError> {
        let reference = format!("memory://{}", path);
        let mut objects = self.objects.write().await;
        objects.insert(
            reference.clone(),
            StoredObject {
                content_type: content_type.to_string(),
                data,
            },
        );
        Ok(reference)
    }

    async fn delete_object(&self, reference: &str) -> Result<(), StoreError> {
        self.objects.write().await.remove(reference);
        Ok(())
    }
}
