use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use moviefinder_core::types::{CatalogRecordType, RecordIdentity};
use moviefinder_ingest::{IngestError, UpsertPipeline};
use moviefinder_store::{StoreClient, StoreError, StoreRow};
use serde_json::{json, Map, Value};

/// In-memory store keyed by the `(tmdb_id, type)` identity pair.
#[derive(Default)]
struct StubStore {
    rows: Mutex<HashMap<RecordIdentity, Map<String, Value>>>,
    insert_calls: AtomicU64,
    update_calls: AtomicU64,
    /// When set, inserts report zero affected rows.
    reject_inserts: bool,
    /// When set, existence checks fail with a store error.
    fail_lookups: bool,
}

impl StubStore {
    fn seeded(identities: &[(i64, CatalogRecordType)]) -> Self {
        let store = Self::default();
        {
            let mut rows = store.rows.lock().unwrap();
            for &(catalog_id, record_type) in identities {
                rows.insert(
                    RecordIdentity {
                        catalog_id,
                        record_type,
                    },
                    Map::new(),
                );
            }
        }
        store
    }

    fn identity_from_columns(columns: &Map<String, Value>) -> RecordIdentity {
        RecordIdentity {
            catalog_id: columns["tmdb_id"].as_i64().unwrap(),
            record_type: columns["type"].as_str().unwrap().parse().unwrap(),
        }
    }
}

#[async_trait]
impl StoreClient for StubStore {
    async fn insert(&self, columns: Map<String, Value>) -> Result<u64, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.reject_inserts {
            return Ok(0);
        }
        let identity = Self::identity_from_columns(&columns);
        self.rows.lock().unwrap().insert(identity, columns);
        Ok(1)
    }

    async fn find_by_identity(
        &self,
        identity: RecordIdentity,
    ) -> Result<Vec<StoreRow>, StoreError> {
        if self.fail_lookups {
            return Err(StoreError::Rejected {
                status: 500,
                body: "boom".into(),
            });
        }
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&identity)
            .map(|columns| StoreRow {
                key: Some(format!(
                    "{}{}",
                    identity.record_type, identity.catalog_id
                )),
                columns: columns.clone(),
            })
            .into_iter()
            .collect())
    }

    async fn update_by_key(
        &self,
        _key: &str,
        _columns: Map<String, Value>,
    ) -> Result<u64, StoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        Ok(1)
    }
}

#[tokio::test]
async fn preseeded_identity_is_skipped_without_insert() {
    let store = StubStore::seeded(&[(1, CatalogRecordType::Movie)]);
    let pipeline = UpsertPipeline::new(store);

    let lines = vec![
        json!({ "id": 1, "original_title": "A", "popularity": 5.0 }),
        json!({ "id": 2, "original_title": "B", "popularity": 1.2 }),
    ];
    let report = pipeline.run_lines(CatalogRecordType::Movie, lines).await;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_duplicate, 1);
    assert_eq!(report.failed, 0);
    // The pre-seeded identity must never reach insert.
    assert_eq!(pipeline.store().insert_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn missing_id_is_recorded_as_malformed_skip() {
    let pipeline = UpsertPipeline::new(StubStore::default());

    let lines = vec![json!({ "original_title": "NoId" })];
    let report = pipeline.run_lines(CatalogRecordType::Movie, lines).await;

    assert_eq!(report.skipped_malformed, 1);
    assert_eq!(report.skipped(), 1);
    assert_eq!(report.inserted, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(pipeline.store().insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn zero_affected_rows_fails_the_record_but_not_the_run() {
    let store = StubStore {
        reject_inserts: true,
        ..Default::default()
    };
    let pipeline = UpsertPipeline::new(store);

    let lines = vec![
        json!({ "id": 10, "original_title": "X" }),
        json!({ "id": 11, "original_title": "Y" }),
    ];
    let report = pipeline.run_lines(CatalogRecordType::Movie, lines).await;

    assert_eq!(report.failed, 2);
    assert_eq!(report.failed_items.len(), 2);
    assert_eq!(report.failed_items[0].catalog_id, 10);
    assert_eq!(report.failed_items[0].reason, "store_rejected");
    assert_eq!(report.failed_items[1].catalog_id, 11);
    // Both records were attempted: one bad record never aborts the batch.
    assert_eq!(pipeline.store().insert_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn failed_existence_check_is_a_failed_item() {
    let store = StubStore {
        fail_lookups: true,
        ..Default::default()
    };
    let pipeline = UpsertPipeline::new(store);

    let lines = vec![json!({ "id": 3, "original_title": "C" })];
    let report = pipeline.run_lines(CatalogRecordType::Movie, lines).await;

    assert_eq!(report.failed, 1);
    assert_eq!(pipeline.store().insert_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn second_run_is_idempotent() {
    let pipeline = UpsertPipeline::new(StubStore::default());
    let lines = || {
        vec![
            json!({ "id": 1, "original_title": "A", "popularity": 5.0 }),
            json!({ "id": 2, "original_title": "B", "popularity": 1.2 }),
        ]
    };

    let first = pipeline.run_lines(CatalogRecordType::Movie, lines()).await;
    assert_eq!(first.inserted, 2);

    let second = pipeline.run_lines(CatalogRecordType::Movie, lines()).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped_duplicate, 2);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn same_id_different_kind_is_not_a_duplicate() {
    // A movie and a series can share a numeric catalog ID; the compound
    // identity keeps them distinct.
    let store = StubStore::seeded(&[(1, CatalogRecordType::Movie)]);
    let pipeline = UpsertPipeline::new(store);

    let lines = vec![json!({ "id": 1, "original_name": "Same Id, Other Kind" })];
    let report = pipeline.run_lines(CatalogRecordType::Series, lines).await;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_duplicate, 0);
}

#[tokio::test]
async fn update_rejects_fields_outside_the_allowed_set() {
    let pipeline = UpsertPipeline::new(StubStore::default());

    let mut fields = Map::new();
    fields.insert("title".to_string(), json!("New Title"));
    fields.insert("tmdb_id".to_string(), json!(999));

    let err = pipeline.update("movie1", fields).await.unwrap_err();
    assert!(matches!(err, IngestError::InvalidField(field) if field == "tmdb_id"));
    // Rejected before any store call.
    assert_eq!(pipeline.store().update_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn update_with_allowed_fields_reaches_the_store() {
    let pipeline = UpsertPipeline::new(StubStore::default());

    let mut fields = Map::new();
    fields.insert("title".to_string(), json!("New Title"));
    fields.insert("popularity".to_string(), json!(9.9));

    let changed = pipeline.update("movie1", fields).await.unwrap();
    assert!(changed);
    assert_eq!(pipeline.store().update_calls.load(Ordering::SeqCst), 1);
}
