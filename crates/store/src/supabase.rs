//! Supabase (PostgREST) implementation of the store boundary.

use async_trait::async_trait;
use moviefinder_core::types::RecordIdentity;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{StoreClient, StoreError, StoreRow};

/// Column holding the store-assigned surrogate key.
const KEY_COLUMN: &str = "unique_id";

/// Store connector configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyzcompany.supabase.co`.
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            table: "mf_main".to_string(),
        }
    }
}

pub struct SupabaseStore {
    config: StoreConfig,
    client: reqwest::Client,
}

impl SupabaseStore {
    /// Connect to the store and probe the table with a one-row select.
    /// A store that cannot be reached at all is fatal to construction.
    pub async fn connect(config: StoreConfig) -> Result<Self, StoreError> {
        let store = Self {
            config,
            client: reqwest::Client::new(),
        };
        store
            .request(reqwest::Method::GET, &[("select", KEY_COLUMN), ("limit", "1")], None)
            .await?;
        Ok(store)
    }

    fn table_url(&self) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.table
        )
    }

    async fn request(
        &self,
        method: reqwest::Method,
        query: &[(&str, &str)],
        body: Option<&Value>,
    ) -> Result<Value, StoreError> {
        let url = self.table_url();
        debug!(method = %method, url = %url, "store request");

        let mut req = self
            .client
            .request(method, &url)
            .query(query)
            .header("apikey", &self.config.api_key)
            .header(
                reqwest::header::AUTHORIZATION,
                format!("Bearer {}", self.config.api_key),
            )
            // Without this PostgREST returns no rows, and affected-row
            // counts are read from the returned representation.
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            req = req.json(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| StoreError::Decode(e.to_string()))
    }
}

#[async_trait]
impl StoreClient for SupabaseStore {
    async fn insert(&self, columns: Map<String, Value>) -> Result<u64, StoreError> {
        let body = Value::Array(vec![Value::Object(columns)]);
        let data = self.request(reqwest::Method::POST, &[], Some(&body)).await?;
        Ok(rows_from_body(data)?.len() as u64)
    }

    async fn find_by_identity(
        &self,
        identity: RecordIdentity,
    ) -> Result<Vec<StoreRow>, StoreError> {
        let id_filter = format!("eq.{}", identity.catalog_id);
        let type_filter = format!("eq.{}", identity.record_type);
        let data = self
            .request(
                reqwest::Method::GET,
                &[
                    ("tmdb_id", id_filter.as_str()),
                    ("type", type_filter.as_str()),
                    ("select", "*"),
                ],
                None,
            )
            .await?;
        rows_from_body(data)
    }

    async fn update_by_key(
        &self,
        key: &str,
        columns: Map<String, Value>,
    ) -> Result<u64, StoreError> {
        let key_filter = format!("eq.{key}");
        let body = Value::Object(columns);
        let data = self
            .request(
                reqwest::Method::PATCH,
                &[(KEY_COLUMN, key_filter.as_str())],
                Some(&body),
            )
            .await?;
        Ok(rows_from_body(data)?.len() as u64)
    }
}

/// Parse a PostgREST response body (always a JSON array of rows) into
/// [`StoreRow`]s, pulling out the surrogate key.
fn rows_from_body(data: Value) -> Result<Vec<StoreRow>, StoreError> {
    let Value::Array(rows) = data else {
        return Err(StoreError::Decode("expected a JSON array of rows".into()));
    };
    rows.into_iter()
        .map(|row| {
            let Value::Object(columns) = row else {
                return Err(StoreError::Decode("expected a JSON object row".into()));
            };
            let key = columns.get(KEY_COLUMN).and_then(|v| match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            });
            Ok(StoreRow { key, columns })
        })
        .collect()
}
