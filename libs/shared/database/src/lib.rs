pub mod collections;
pub mod error;
pub mod filter;
pub mod memory;
pub mod store;
pub mod supabase;

use std::sync::Arc;

use tracing::{info, warn};

use shared_config::AppConfig;

pub use error::StoreError;
pub use filter::{Filter, FindOptions, GroupCount, SortOrder};
pub use memory::MemoryStore;
pub use store::{DocumentStore, ObjectStore};
pub use supabase::SupabaseClient;

pub type SharedStore = Arc<dyn DocumentStore>;
pub type SharedObjectStore = Arc<dyn ObjectStore>;

/// Document and object storage handles shared by every cell.
#[derive(Clone)]
pub struct Database {
    pub documents: SharedStore,
    pub objects: SharedObjectStore,
}

impl Database {
    /// Supabase when configured, otherwise a process-local store.
    pub fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        if config.is_configured() {
            info!("Using Supabase backend at {}", config.supabase_url);
            let client = Arc::new(SupabaseClient::new(config)?);
            Ok(Self {
                documents: client.clone(),
                objects: client,
            })
        } else {
            warn!("Using in-memory backend; data is lost on restart");
            Ok(Self::in_memory())
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            documents: store.clone(),
            objects: store,
        }
    }
}
