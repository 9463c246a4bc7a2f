//! Bulk ingestion: daily export → normalize → existence check → insert.
//!
//! One run processes records strictly in file line order. Per-record
//! problems (malformed line, store rejection) become report entries and the
//! run continues; only a failed export fetch aborts the run.

use moviefinder_catalog::normalize;
use moviefinder_catalog::CatalogClient;
use moviefinder_core::types::{CatalogRecordType, NormalizedRecord, RecordIdentity};
use moviefinder_store::StoreClient;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::IngestError;

/// Columns an out-of-band update may touch. `tmdb_id` is immutable
/// post-insert and deliberately absent.
pub const MUTABLE_COLUMNS: &[&str] = &["title", "type", "popularity"];

/// Outcome totals for one ingestion run. `failed_items` carries enough to
/// drive an out-of-band retry.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct IngestionReport {
    pub inserted: u64,
    pub skipped_duplicate: u64,
    pub skipped_malformed: u64,
    pub failed: u64,
    pub failed_items: Vec<FailedItem>,
}

impl IngestionReport {
    pub fn skipped(&self) -> u64 {
        self.skipped_duplicate + self.skipped_malformed
    }

    fn fail(&mut self, identity: RecordIdentity) {
        self.failed += 1;
        self.failed_items.push(FailedItem {
            catalog_id: identity.catalog_id,
            record_type: identity.record_type,
            reason: "store_rejected".to_string(),
        });
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FailedItem {
    pub catalog_id: i64,
    pub record_type: CatalogRecordType,
    pub reason: String,
}

/// Drives bulk ingestion runs for one store.
pub struct UpsertPipeline<S> {
    store: S,
}

impl<S: StoreClient> UpsertPipeline<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One end-to-end ingestion run for `kind`. Fails outright only when the
    /// bulk-export fetch cannot be established.
    pub async fn run(
        &self,
        catalog: &CatalogClient,
        kind: CatalogRecordType,
    ) -> Result<IngestionReport, IngestError> {
        let lines = catalog.fetch_daily_export(kind).await?;
        Ok(self.run_lines(kind, lines).await)
    }

    /// The per-record loop, split from [`Self::run`] so the export source can be
    /// substituted. Always completes with a full report.
    pub async fn run_lines<I>(&self, kind: CatalogRecordType, lines: I) -> IngestionReport
    where
        I: IntoIterator<Item = Value>,
    {
        let mut report = IngestionReport::default();

        for raw in lines {
            let record = match normalize::normalize_export_line(kind, &raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(kind = %kind, error = %e, "skipping malformed export record");
                    report.skipped_malformed += 1;
                    continue;
                }
            };

            self.upsert_record(&record, &mut report).await;
        }

        info!(
            kind = %kind,
            inserted = report.inserted,
            skipped = report.skipped(),
            failed = report.failed,
            "ingestion run complete"
        );
        report
    }

    /// Existence check then insert. The check-then-insert pair is the dedup
    /// enforcement point: a record whose identity already has a row is never
    /// handed to insert.
    async fn upsert_record(&self, record: &NormalizedRecord, report: &mut IngestionReport) {
        let identity = record.identity();

        let existing = match self.store.find_by_identity(identity).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(catalog_id = identity.catalog_id, error = %e, "existence check failed");
                report.fail(identity);
                return;
            }
        };

        if !existing.is_empty() {
            debug!(
                catalog_id = identity.catalog_id,
                kind = %identity.record_type,
                "duplicate identity, skipping insert"
            );
            report.skipped_duplicate += 1;
            return;
        }

        match self.store.insert(record_columns(record)).await {
            Ok(affected) if affected > 0 => report.inserted += 1,
            Ok(_) => {
                warn!(catalog_id = identity.catalog_id, "store reported zero rows written");
                report.fail(identity);
            }
            Err(e) => {
                warn!(catalog_id = identity.catalog_id, error = %e, "store rejected insert");
                report.fail(identity);
            }
        }
    }

    /// Out-of-band update of a stored record by its surrogate key. `fields`
    /// must stay within [`MUTABLE_COLUMNS`]; returns whether any row changed.
    pub async fn update(
        &self,
        key: &str,
        fields: Map<String, Value>,
    ) -> Result<bool, IngestError> {
        if let Some(bad) = fields
            .keys()
            .find(|k| !MUTABLE_COLUMNS.contains(&k.as_str()))
        {
            return Err(IngestError::InvalidField(bad.clone()));
        }
        let affected = self.store.update_by_key(key, fields).await?;
        Ok(affected > 0)
    }
}

/// Column mapping for the store's main table.
fn record_columns(record: &NormalizedRecord) -> Map<String, Value> {
    let mut columns = Map::new();
    columns.insert("tmdb_id".to_string(), record.catalog_id.into());
    columns.insert(
        "title".to_string(),
        record.title.clone().map(Value::String).unwrap_or(Value::Null),
    );
    columns.insert(
        "type".to_string(),
        Value::String(record.record_type.as_str().to_string()),
    );
    columns.insert(
        "popularity".to_string(),
        record
            .popularity
            .and_then(|p| serde_json::Number::from_f64(p).map(Value::Number))
            .unwrap_or(Value::Null),
    );
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviefinder_core::types::CatalogRecordType;

    #[test]
    fn record_columns_cover_the_table_contract() {
        let record = NormalizedRecord {
            catalog_id: 603,
            record_type: CatalogRecordType::Movie,
            title: Some("The Matrix".into()),
            popularity: Some(81.4),
        };
        let columns = record_columns(&record);
        assert_eq!(columns["tmdb_id"], 603);
        assert_eq!(columns["title"], "The Matrix");
        assert_eq!(columns["type"], "movie");
        assert!((columns["popularity"].as_f64().unwrap() - 81.4).abs() < 1e-9);
    }

    #[test]
    fn record_columns_keep_absent_fields_null() {
        let record = NormalizedRecord {
            catalog_id: 1,
            record_type: CatalogRecordType::Artist,
            title: None,
            popularity: None,
        };
        let columns = record_columns(&record);
        assert!(columns["title"].is_null());
        assert!(columns["popularity"].is_null());
        assert_eq!(columns["type"], "artist");
    }
}
