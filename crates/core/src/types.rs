use serde::{Deserialize, Serialize};

/// Kind of catalog record stored in the `type` column.
///
/// `Network` is reserved for broadcaster records and is not produced by the
/// ingestion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogRecordType {
    Movie,
    Series,
    Artist,
    Network,
}

impl CatalogRecordType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "series",
            Self::Artist => "artist",
            Self::Network => "network",
        }
    }

    /// Path segment used by the catalog API (`/movie/{id}`, `/tv/{id}`, …).
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Series => "tv",
            Self::Artist => "person",
            Self::Network => "network",
        }
    }

    /// File name stem of the daily bulk export, or `None` for kinds the
    /// catalog does not publish exports for.
    pub fn export_stem(self) -> Option<&'static str> {
        match self {
            Self::Movie => Some("movie"),
            Self::Series => Some("tv_series"),
            Self::Artist => Some("person"),
            Self::Network => None,
        }
    }
}

impl std::fmt::Display for CatalogRecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CatalogRecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "movie" => Ok(Self::Movie),
            "series" | "tv" => Ok(Self::Series),
            "artist" | "person" => Ok(Self::Artist),
            "network" => Ok(Self::Network),
            other => Err(format!("unknown record type: {other}")),
        }
    }
}

/// Dedup key for a catalog record. Unique in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordIdentity {
    pub catalog_id: i64,
    pub record_type: CatalogRecordType,
}

/// The unit moved through the ingestion pipeline. Built once per export
/// line, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub catalog_id: i64,
    pub record_type: CatalogRecordType,
    pub title: Option<String>,
    pub popularity: Option<f64>,
}

impl NormalizedRecord {
    pub fn identity(&self) -> RecordIdentity {
        RecordIdentity {
            catalog_id: self.catalog_id,
            record_type: self.record_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_type_round_trips_through_str() {
        for kind in [
            CatalogRecordType::Movie,
            CatalogRecordType::Series,
            CatalogRecordType::Artist,
            CatalogRecordType::Network,
        ] {
            assert_eq!(kind.as_str().parse::<CatalogRecordType>(), Ok(kind));
        }
    }

    #[test]
    fn record_type_parses_catalog_path_segments() {
        assert_eq!("tv".parse(), Ok(CatalogRecordType::Series));
        assert_eq!("person".parse(), Ok(CatalogRecordType::Artist));
        assert!("genre".parse::<CatalogRecordType>().is_err());
    }

    #[test]
    fn network_kind_has_no_export() {
        assert!(CatalogRecordType::Network.export_stem().is_none());
        assert_eq!(CatalogRecordType::Series.export_stem(), Some("tv_series"));
    }

    #[test]
    fn identity_ignores_descriptive_fields() {
        let a = NormalizedRecord {
            catalog_id: 7,
            record_type: CatalogRecordType::Movie,
            title: Some("A".into()),
            popularity: Some(1.0),
        };
        let b = NormalizedRecord {
            catalog_id: 7,
            record_type: CatalogRecordType::Movie,
            title: Some("B".into()),
            popularity: None,
        };
        assert_eq!(a.identity(), b.identity());
    }
}
