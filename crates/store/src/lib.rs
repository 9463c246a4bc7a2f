//! Store boundary: opaque create/read/update against the hosted backend.
//!
//! The pipeline's whole contract with the store is here: insert takes a
//! column→value mapping and reports an affected-row count, lookup by the
//! `(catalog_id, record_type)` identity returns zero or more rows, update
//! goes by the store-assigned surrogate key.

pub mod supabase;

use async_trait::async_trait;
use moviefinder_core::types::RecordIdentity;
use serde_json::{Map, Value};
use thiserror::Error;

pub use supabase::{SupabaseStore, StoreConfig};

#[derive(Debug, Error)]
pub enum StoreError {
    /// Network-level failure: no response from the store.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

/// One row as the store returned it. `key` is the store-assigned surrogate
/// key, used only for updates.
#[derive(Debug, Clone)]
pub struct StoreRow {
    pub key: Option<String>,
    pub columns: Map<String, Value>,
}

#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Insert one row. Returns the number of rows the store reports as
    /// written (zero means the insert was rejected without raising).
    async fn insert(&self, columns: Map<String, Value>) -> Result<u64, StoreError>;

    /// All rows matching the identity pair. Empty means the record is novel.
    async fn find_by_identity(&self, identity: RecordIdentity)
        -> Result<Vec<StoreRow>, StoreError>;

    /// Update the row with the given surrogate key. Returns the number of
    /// rows affected.
    async fn update_by_key(
        &self,
        key: &str,
        columns: Map<String, Value>,
    ) -> Result<u64, StoreError>;
}
