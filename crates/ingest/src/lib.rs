pub mod pipeline;

use thiserror::Error;

pub use pipeline::{FailedItem, IngestionReport, UpsertPipeline, MUTABLE_COLUMNS};

#[derive(Debug, Error)]
pub enum IngestError {
    /// The bulk-export fetch itself could not be established. The only way
    /// an ingestion run fails outright.
    #[error(transparent)]
    Catalog(#[from] moviefinder_catalog::CatalogError),

    /// Store failure outside the per-record loop (e.g. during an update).
    #[error(transparent)]
    Store(#[from] moviefinder_store::StoreError),

    /// An update asked to mutate a column outside the allowed set. Rejected
    /// before any store call.
    #[error("field `{0}` is not updatable (allowed: title, type, popularity)")]
    InvalidField(String),
}
