//! Catalog (TMDB) API client.
//!
//! Uses TMDB API v3: https://developer.themoviedb.org/docs

use std::time::Duration;

use moviefinder_core::types::CatalogRecordType;
use tracing::{debug, warn};

use crate::export::ExportLines;
use crate::normalize;
use crate::{CatalogError, MovieDetail};

const BASE_URL: &str = "https://api.themoviedb.org/3";
const EXPORT_BASE_URL: &str = "http://files.tmdb.org/p/exports";

/// Fixed pause between consecutive popular-listing page requests, to stay
/// under the upstream rate limit. Not a backoff.
const PAGE_DELAY: Duration = Duration::from_secs(5);

/// Catalog connector configuration. Credentials come in here, not from
/// globals; the binaries read them from the environment.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub api_key: String,
}

/// Image settings from the catalog's `/configuration` endpoint.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ImageConfig {
    pub base_url: String,
    pub secure_base_url: String,
    pub backdrop_sizes: Vec<String>,
    pub poster_sizes: Vec<String>,
    pub profile_sizes: Vec<String>,
}

impl ImageConfig {
    fn from_configuration(data: &serde_json::Value) -> Result<Self, CatalogError> {
        let images = data
            .get("images")
            .ok_or_else(|| CatalogError::Decode("configuration missing images section".into()))?;
        let str_field = |key: &str| -> Result<String, CatalogError> {
            images[key]
                .as_str()
                .map(|s| s.to_string())
                .ok_or_else(|| CatalogError::Decode(format!("configuration missing images.{key}")))
        };
        let list_field = |key: &str| -> Vec<String> {
            images[key]
                .as_array()
                .map(|a| {
                    a.iter()
                        .filter_map(|v| v.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default()
        };
        Ok(Self {
            base_url: str_field("base_url")?,
            secure_base_url: str_field("secure_base_url")?,
            backdrop_sizes: list_field("backdrop_sizes"),
            poster_sizes: list_field("poster_sizes"),
            profile_sizes: list_field("profile_sizes"),
        })
    }

    /// Full image URL for a path returned by the catalog API.
    pub fn image_url(&self, path: &str, size: &str, secure: bool) -> String {
        let base = if secure {
            &self.secure_base_url
        } else {
            &self.base_url
        };
        format!("{base}{size}{path}")
    }
}

pub struct CatalogClient {
    api_key: String,
    client: reqwest::Client,
    images: ImageConfig,
}

impl CatalogClient {
    /// Connect to the catalog API. Fetches `/configuration` once; without it
    /// the client cannot build image URLs, so failure here is fatal.
    pub async fn connect(config: CatalogConfig) -> Result<Self, CatalogError> {
        let client = reqwest::Client::new();
        let data = get_json(&client, &config.api_key, "/configuration", &[]).await?;
        let images = ImageConfig::from_configuration(&data)?;
        Ok(Self {
            api_key: config.api_key,
            client,
            images,
        })
    }

    pub fn images(&self) -> &ImageConfig {
        &self.images
    }

    /// Download today's bulk export for `kind` and return an iterator over
    /// its decoded JSON lines. Consume-once; malformed lines are skipped
    /// inside the iterator, not fatal to the sequence.
    pub async fn fetch_daily_export(
        &self,
        kind: CatalogRecordType,
    ) -> Result<ExportLines, CatalogError> {
        let stem = kind
            .export_stem()
            .ok_or(CatalogError::NoDailyExport(kind))?;
        let today = chrono::Utc::now().format("%d_%m_%Y");
        let url = format!("{EXPORT_BASE_URL}/{stem}_ids_{today}.json.gz");
        debug!(url = %url, "daily export download");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| CatalogError::Transport(e.to_string()))?;
        Ok(ExportLines::new(body.to_vec()))
    }

    /// Single-item detail fetch for `kind`/`id`. Raw JSON; see
    /// [`crate::normalize`] for the typed mapping.
    pub async fn fetch_details(
        &self,
        kind: CatalogRecordType,
        catalog_id: i64,
    ) -> Result<serde_json::Value, CatalogError> {
        self.get(&format!("/{}/{catalog_id}", kind.path_segment()), &[])
            .await
    }

    /// Page through the popular listing for `kind`, collecting raw result
    /// objects until `count` items are gathered or the upstream reports no
    /// further pages. A fixed delay is observed between page requests.
    pub async fn fetch_popular(
        &self,
        kind: CatalogRecordType,
        count: usize,
    ) -> Result<Vec<serde_json::Value>, CatalogError> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let path = format!("/{}/popular", kind.path_segment());
        let mut items = Vec::new();
        let mut page = 1u64;

        loop {
            let data = self.get(&path, &[("page", &page.to_string())]).await?;
            let last_page = extend_from_page(&mut items, &data);
            if last_page || items.len() >= count {
                break;
            }
            page += 1;
            tokio::time::sleep(PAGE_DELAY).await;
        }

        items.truncate(count);
        Ok(items)
    }

    /// Popular movie listing as typed records. Entries that cannot be mapped
    /// are skipped, not fatal to the listing.
    pub async fn popular_movie_details(
        &self,
        count: usize,
    ) -> Result<Vec<MovieDetail>, CatalogError> {
        let raw = self.fetch_popular(CatalogRecordType::Movie, count).await?;
        Ok(movie_details_from(&raw))
    }

    async fn get(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, CatalogError> {
        get_json(&self.client, &self.api_key, path, params).await
    }

    #[cfg(test)]
    fn unconnected() -> Self {
        Self {
            api_key: "test-key".to_string(),
            client: reqwest::Client::new(),
            images: ImageConfig {
                base_url: "http://image.tmdb.org/t/p/".into(),
                secure_base_url: "https://image.tmdb.org/t/p/".into(),
                backdrop_sizes: Vec::new(),
                poster_sizes: Vec::new(),
                profile_sizes: Vec::new(),
            },
        }
    }
}

async fn get_json(
    client: &reqwest::Client,
    api_key: &str,
    path: &str,
    params: &[(&str, &str)],
) -> Result<serde_json::Value, CatalogError> {
    let mut all_params = vec![("api_key", api_key)];
    all_params.extend_from_slice(params);

    let url = format!("{BASE_URL}{path}");
    debug!(url = %url, "catalog request");

    let resp = client
        .get(&url)
        .query(&all_params)
        .send()
        .await
        .map_err(|e| CatalogError::Transport(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CatalogError::Upstream {
            status: status.as_u16(),
            body,
        });
    }

    resp.json()
        .await
        .map_err(|e| CatalogError::Decode(e.to_string()))
}

fn movie_details_from(items: &[serde_json::Value]) -> Vec<MovieDetail> {
    items
        .iter()
        .filter_map(|raw| match normalize::movie_detail(raw) {
            Ok(detail) => Some(detail),
            Err(e) => {
                warn!(error = %e, "skipping unmappable popular listing entry");
                None
            }
        })
        .collect()
}

/// Append one popular-listing page to `items`. Returns true when the page
/// reports itself as the final one.
fn extend_from_page(items: &mut Vec<serde_json::Value>, data: &serde_json::Value) -> bool {
    if let Some(results) = data["results"].as_array() {
        items.extend(results.iter().cloned());
    }
    let page = data["page"].as_u64().unwrap_or(0);
    let total_pages = data["total_pages"].as_u64().unwrap_or(page);
    page >= total_pages
}
