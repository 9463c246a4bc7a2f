//! Streaming-availability lookups via the RapidAPI service.
//!
//! Read-only and independent of the ingestion pipeline. No retry, no
//! caching; both are the caller's responsibility.

use moviefinder_core::types::CatalogRecordType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const BASE_URL: &str = "https://streaming-availability.p.rapidapi.com";
const HOST: &str = "streaming-availability.p.rapidapi.com";

#[derive(Debug, Error)]
pub enum AvailabilityError {
    /// Network-level failure: no HTTP response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The availability API answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("decode error: {0}")]
    Decode(String),
}

/// Streaming platforms the availability API reports on. Variant names map
/// to the lowercase keys of the `/countries` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Netflix,
    Prime,
    Disney,
    Hbo,
    Hulu,
    Peacock,
    Paramount,
    Apple,
    Mubi,
    Showtime,
}

impl Platform {
    pub const ALL: [Platform; 10] = [
        Self::Netflix,
        Self::Prime,
        Self::Disney,
        Self::Hbo,
        Self::Hulu,
        Self::Peacock,
        Self::Paramount,
        Self::Apple,
        Self::Mubi,
        Self::Showtime,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Netflix => "netflix",
            Self::Prime => "prime",
            Self::Disney => "disney",
            Self::Hbo => "hbo",
            Self::Hulu => "hulu",
            Self::Peacock => "peacock",
            Self::Paramount => "paramount",
            Self::Apple => "apple",
            Self::Mubi => "mubi",
            Self::Showtime => "showtime",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Availability connector configuration.
#[derive(Debug, Clone)]
pub struct AvailabilityConfig {
    pub api_key: String,
}

pub struct StreamingAvailabilityClient {
    api_key: String,
    client: reqwest::Client,
}

impl StreamingAvailabilityClient {
    pub fn new(config: AvailabilityConfig) -> Self {
        Self {
            api_key: config.api_key,
            client: reqwest::Client::new(),
        }
    }

    /// Country codes where `platform` operates.
    pub async fn countries_for_platform(
        &self,
        platform: Platform,
    ) -> Result<Vec<String>, AvailabilityError> {
        let data = self.get_json("/countries", &[]).await?;
        Ok(platform_countries(&data, platform))
    }

    /// Whether `platform` operates in `country`.
    pub async fn platform_available_in(
        &self,
        platform: Platform,
        country: &str,
    ) -> Result<bool, AvailabilityError> {
        let data = self.get_json("/countries", &[]).await?;
        Ok(platform_countries(&data, platform)
            .iter()
            .any(|c| c == country))
    }

    /// All platforms operating in `country`.
    pub async fn platforms_for_country(
        &self,
        country: &str,
    ) -> Result<Vec<Platform>, AvailabilityError> {
        let data = self.get_json("/countries", &[]).await?;
        Ok(platforms_in(&data, country))
    }

    /// Platform/country availability details for a single catalog record.
    pub async fn availability_details(
        &self,
        kind: CatalogRecordType,
        catalog_id: i64,
        country: &str,
        language: &str,
    ) -> Result<serde_json::Value, AvailabilityError> {
        let tmdb_id = format!("{}/{catalog_id}", kind.path_segment());
        self.get_json(
            "/get/basic",
            &[
                ("tmdb_id", tmdb_id.as_str()),
                ("country", country),
                ("output_language", language),
            ],
        )
        .await
    }

    /// Genre id → name mapping as reported by the availability API.
    pub async fn genre_names(
        &self,
    ) -> Result<serde_json::Map<String, serde_json::Value>, AvailabilityError> {
        let data = self.get_json("/genres", &[]).await?;
        match data {
            serde_json::Value::Object(map) => Ok(map),
            _ => Err(AvailabilityError::Decode(
                "expected a JSON object of genres".into(),
            )),
        }
    }

    async fn get_json(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<serde_json::Value, AvailabilityError> {
        let url = format!("{BASE_URL}{path}");
        debug!(url = %url, "availability request");

        let resp = self
            .client
            .get(&url)
            .query(params)
            .header("X-RapidAPI-Key", &self.api_key)
            .header("X-RapidAPI-Host", HOST)
            .send()
            .await
            .map_err(|e| AvailabilityError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AvailabilityError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        resp.json()
            .await
            .map_err(|e| AvailabilityError::Decode(e.to_string()))
    }
}

fn platform_countries(data: &serde_json::Value, platform: Platform) -> Vec<String> {
    data[platform.as_str()]
        .as_array()
        .map(|countries| {
            countries
                .iter()
                .filter_map(|c| c.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn platforms_in(data: &serde_json::Value, country: &str) -> Vec<Platform> {
    Platform::ALL
        .into_iter()
        .filter(|platform| {
            platform_countries(data, *platform)
                .iter()
                .any(|c| c == country)
        })
        .collect()
}
