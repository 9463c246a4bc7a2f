//! Pure mapping from raw catalog JSON to typed records.
//!
//! No I/O in here; everything is deterministic given the input value, which
//! keeps this the main unit-test surface of the crate.

use chrono::NaiveDate;
use moviefinder_core::types::{CatalogRecordType, NormalizedRecord};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{ArtistDetail, DetailRecord, MovieDetail, SeriesDetail};

/// A single export line or detail payload that cannot be mapped. Local to
/// that record; never aborts a batch.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("malformed record: missing required field `{field}`")]
pub struct MalformedRecord {
    pub field: &'static str,
}

/// Map one bulk-export line to a [`NormalizedRecord`].
///
/// The title field depends on the kind: `original_title` for movies,
/// `original_name` for series, `name` for artists. Only `id` is required.
pub fn normalize_export_line(
    kind: CatalogRecordType,
    raw: &Value,
) -> Result<NormalizedRecord, MalformedRecord> {
    let catalog_id = raw["id"]
        .as_i64()
        .ok_or(MalformedRecord { field: "id" })?;

    let title_field = match kind {
        CatalogRecordType::Movie => "original_title",
        CatalogRecordType::Series => "original_name",
        CatalogRecordType::Artist | CatalogRecordType::Network => "name",
    };

    Ok(NormalizedRecord {
        catalog_id,
        record_type: kind,
        title: raw[title_field].as_str().map(|s| s.to_string()),
        popularity: raw["popularity"].as_f64(),
    })
}

/// Map a detail response to the typed record for `kind`.
pub fn detail_record(
    kind: CatalogRecordType,
    raw: &Value,
) -> Result<DetailRecord, MalformedRecord> {
    match kind {
        CatalogRecordType::Movie => movie_detail(raw).map(DetailRecord::Movie),
        CatalogRecordType::Series => series_detail(raw).map(DetailRecord::Series),
        CatalogRecordType::Artist | CatalogRecordType::Network => {
            artist_detail(raw).map(DetailRecord::Artist)
        }
    }
}

pub fn movie_detail(raw: &Value) -> Result<MovieDetail, MalformedRecord> {
    let catalog_id = raw["id"]
        .as_i64()
        .ok_or(MalformedRecord { field: "id" })?;

    Ok(MovieDetail {
        catalog_id,
        title: string_field(raw, "title"),
        overview: string_field(raw, "overview"),
        tagline: string_field(raw, "tagline"),
        runtime_minutes: raw["runtime"].as_i64(),
        release_date: parse_date(raw["release_date"].as_str()),
        release_status: string_field(raw, "status"),
        genres: name_list(&raw["genres"]),
        popularity: raw["popularity"].as_f64(),
        vote_average: raw["vote_average"].as_f64(),
        vote_count: raw["vote_count"].as_i64(),
        poster_path: string_field(raw, "poster_path"),
        backdrop_path: string_field(raw, "backdrop_path"),
        meta_data: collect_meta(
            raw,
            &[
                "adult",
                "belongs_to_collection",
                "budget",
                "homepage",
                "imdb_id",
                "original_language",
                "original_title",
                "production_companies",
                "production_countries",
                "revenue",
                "spoken_languages",
                "video",
            ],
        ),
    })
}

pub fn series_detail(raw: &Value) -> Result<SeriesDetail, MalformedRecord> {
    let catalog_id = raw["id"]
        .as_i64()
        .ok_or(MalformedRecord { field: "id" })?;

    Ok(SeriesDetail {
        catalog_id,
        title: string_field(raw, "name"),
        overview: string_field(raw, "overview"),
        tagline: string_field(raw, "tagline"),
        episode_run_time: raw["episode_run_time"]
            .as_array()
            .and_then(|a| a.first())
            .and_then(|v| v.as_i64()),
        first_air_date: parse_date(raw["first_air_date"].as_str()),
        release_status: string_field(raw, "status"),
        genres: name_list(&raw["genres"]),
        networks: name_list(&raw["networks"]),
        popularity: raw["popularity"].as_f64(),
        vote_average: raw["vote_average"].as_f64(),
        vote_count: raw["vote_count"].as_i64(),
        poster_path: string_field(raw, "poster_path"),
        backdrop_path: string_field(raw, "backdrop_path"),
        meta_data: collect_meta(
            raw,
            &[
                "adult",
                "created_by",
                "homepage",
                "in_production",
                "languages",
                "last_air_date",
                "last_episode_to_air",
                "next_episode_to_air",
                "number_of_episodes",
                "number_of_seasons",
                "origin_country",
                "original_language",
                "original_name",
                "production_companies",
                "production_countries",
                "seasons",
                "spoken_languages",
                "type",
            ],
        ),
    })
}

pub fn artist_detail(raw: &Value) -> Result<ArtistDetail, MalformedRecord> {
    let catalog_id = raw["id"]
        .as_i64()
        .ok_or(MalformedRecord { field: "id" })?;

    Ok(ArtistDetail {
        catalog_id,
        name: string_field(raw, "name"),
        biography: string_field(raw, "biography"),
        imdb_id: string_field(raw, "imdb_id"),
        popularity: raw["popularity"].as_f64(),
        profile_path: string_field(raw, "profile_path"),
        meta_data: collect_meta(
            raw,
            &[
                "also_known_as",
                "birthday",
                "deathday",
                "gender",
                "homepage",
                "known_for_department",
                "place_of_birth",
            ],
        ),
    })
}

/// Absent or unparsable dates become `None`, never an error.
fn parse_date(s: Option<&str>) -> Option<NaiveDate> {
    s.and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn string_field(raw: &Value, key: &str) -> Option<String> {
    raw[key].as_str().map(|s| s.to_string())
}

fn name_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["name"].as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default()
}

fn collect_meta(raw: &Value, keys: &[&str]) -> Map<String, Value> {
    let mut meta = Map::new();
    for key in keys {
        if let Some(value) = raw.get(*key) {
            if !value.is_null() {
                meta.insert((*key).to_string(), value.clone());
            }
        }
    }
    meta
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalize_movie_export_line() {
        let raw = json!({ "id": 603, "original_title": "The Matrix", "popularity": 81.4 });
        let rec = normalize_export_line(CatalogRecordType::Movie, &raw).unwrap();
        assert_eq!(rec.catalog_id, 603);
        assert_eq!(rec.record_type, CatalogRecordType::Movie);
        assert_eq!(rec.title.as_deref(), Some("The Matrix"));
        assert!((rec.popularity.unwrap() - 81.4).abs() < 1e-9);
    }

    #[test]
    fn normalize_series_and_artist_title_fields() {
        let series = json!({ "id": 1396, "original_name": "Breaking Bad", "popularity": 300.0 });
        let rec = normalize_export_line(CatalogRecordType::Series, &series).unwrap();
        assert_eq!(rec.title.as_deref(), Some("Breaking Bad"));

        let artist = json!({ "id": 6384, "name": "Keanu Reeves", "popularity": 20.1 });
        let rec = normalize_export_line(CatalogRecordType::Artist, &artist).unwrap();
        assert_eq!(rec.title.as_deref(), Some("Keanu Reeves"));
    }

    #[test]
    fn missing_id_is_malformed() {
        let raw = json!({ "original_title": "NoId" });
        let err = normalize_export_line(CatalogRecordType::Movie, &raw).unwrap_err();
        assert_eq!(err.field, "id");
    }

    #[test]
    fn missing_descriptive_fields_are_tolerated() {
        let raw = json!({ "id": 42 });
        let rec = normalize_export_line(CatalogRecordType::Movie, &raw).unwrap();
        assert_eq!(rec.title, None);
        assert_eq!(rec.popularity, None);
    }

    #[test]
    fn movie_detail_promotes_fixed_fields_and_spills_the_rest() {
        let raw = json!({
            "id": 27205,
            "title": "Inception",
            "overview": "A thief who steals corporate secrets…",
            "tagline": "Your mind is the scene of the crime.",
            "runtime": 148,
            "release_date": "2010-07-16",
            "status": "Released",
            "genres": [{ "id": 28, "name": "Action" }, { "id": 878, "name": "Science Fiction" }],
            "popularity": 70.2,
            "vote_average": 8.4,
            "vote_count": 34000,
            "poster_path": "/poster.jpg",
            "budget": 160000000,
            "imdb_id": "tt1375666",
            "original_language": "en"
        });
        let detail = movie_detail(&raw).unwrap();
        assert_eq!(detail.catalog_id, 27205);
        assert_eq!(detail.runtime_minutes, Some(148));
        assert_eq!(
            detail.release_date,
            NaiveDate::from_ymd_opt(2010, 7, 16)
        );
        assert_eq!(detail.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(detail.meta_data["imdb_id"], "tt1375666");
        assert_eq!(detail.meta_data["budget"], 160000000);
        assert!(!detail.meta_data.contains_key("title"));
    }

    #[test]
    fn unparsable_date_becomes_none() {
        let raw = json!({ "id": 1, "title": "X", "release_date": "not-a-date" });
        let detail = movie_detail(&raw).unwrap();
        assert_eq!(detail.release_date, None);

        let raw = json!({ "id": 2, "title": "Y", "release_date": "" });
        assert_eq!(movie_detail(&raw).unwrap().release_date, None);
    }

    #[test]
    fn series_detail_takes_first_episode_run_time() {
        let raw = json!({
            "id": 1396,
            "name": "Breaking Bad",
            "episode_run_time": [45, 47],
            "first_air_date": "2008-01-20",
            "networks": [{ "name": "AMC" }],
            "number_of_seasons": 5
        });
        let detail = series_detail(&raw).unwrap();
        assert_eq!(detail.episode_run_time, Some(45));
        assert_eq!(detail.networks, vec!["AMC"]);
        assert_eq!(detail.meta_data["number_of_seasons"], 5);
    }

    #[test]
    fn artist_detail_maps_biography_and_meta() {
        let raw = json!({
            "id": 6384,
            "name": "Keanu Reeves",
            "biography": "Keanu Charles Reeves is a Canadian actor…",
            "imdb_id": "nm0000206",
            "birthday": "1964-09-02",
            "place_of_birth": "Beirut, Lebanon"
        });
        let detail = artist_detail(&raw).unwrap();
        assert_eq!(detail.name.as_deref(), Some("Keanu Reeves"));
        assert_eq!(detail.imdb_id.as_deref(), Some("nm0000206"));
        assert_eq!(detail.meta_data["place_of_birth"], "Beirut, Lebanon");
    }

    #[test]
    fn detail_record_dispatches_on_kind() {
        let raw = json!({ "id": 1, "title": "X" });
        assert!(matches!(
            detail_record(CatalogRecordType::Movie, &raw),
            Ok(DetailRecord::Movie(_))
        ));
        assert!(matches!(
            detail_record(CatalogRecordType::Series, &raw),
            Ok(DetailRecord::Series(_))
        ));
    }
}
