pub mod client;
pub mod export;
pub mod normalize;

use chrono::NaiveDate;
use thiserror::Error;

pub use client::{CatalogClient, CatalogConfig, ImageConfig};
pub use export::ExportLines;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network-level failure: no HTTP response was received.
    #[error("transport error: {0}")]
    Transport(String),

    /// The catalog API answered with a non-success status.
    #[error("upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A success response that could not be decoded as JSON.
    #[error("decode error: {0}")]
    Decode(String),

    /// The catalog publishes no daily export for this record kind.
    #[error("no daily export for record kind {0}")]
    NoDailyExport(moviefinder_core::types::CatalogRecordType),
}

/// Richer record built from a single-item detail call. Not part of the bulk
/// ingestion path; the dedup-key invariant does not apply here.
#[derive(Debug, Clone)]
pub enum DetailRecord {
    Movie(MovieDetail),
    Series(SeriesDetail),
    Artist(ArtistDetail),
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct MovieDetail {
    pub catalog_id: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub runtime_minutes: Option<i64>,
    pub release_date: Option<NaiveDate>,
    pub release_status: Option<String>,
    pub genres: Vec<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    /// Secondary fields not promoted to typed attributes.
    pub meta_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SeriesDetail {
    pub catalog_id: i64,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub tagline: Option<String>,
    pub episode_run_time: Option<i64>,
    pub first_air_date: Option<NaiveDate>,
    pub release_status: Option<String>,
    pub genres: Vec<String>,
    pub networks: Vec<String>,
    pub popularity: Option<f64>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<i64>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub meta_data: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ArtistDetail {
    pub catalog_id: i64,
    pub name: Option<String>,
    pub biography: Option<String>,
    pub imdb_id: Option<String>,
    pub popularity: Option<f64>,
    pub profile_path: Option<String>,
    pub meta_data: serde_json::Map<String, serde_json::Value>,
}
