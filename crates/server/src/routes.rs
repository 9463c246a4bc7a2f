use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use moviefinder_core::error::ApiError;
use moviefinder_core::types::{CatalogRecordType, RecordIdentity};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::auth::AuthToken;
use crate::error::AppError;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_router())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

fn api_router() -> Router<AppState> {
    Router::new().route("/available", get(get_available))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Deserialize)]
struct AvailableQuery {
    #[serde(rename = "type")]
    record_type: String,
    tmdb_id: i64,
    country: Option<String>,
    language: Option<String>,
}

/// Availability lookup for one stored record: store lookup by identity,
/// then platform/country data from the availability API. The availability
/// fetch is best-effort; the record itself is not.
async fn get_available(
    State(state): State<AppState>,
    _auth: AuthToken,
    Query(query): Query<AvailableQuery>,
) -> Result<Json<Value>, AppError> {
    let kind: CatalogRecordType = query
        .record_type
        .parse()
        .map_err(ApiError::BadRequest)?;
    let identity = RecordIdentity {
        catalog_id: query.tmdb_id,
        record_type: kind,
    };

    let rows = state
        .store
        .find_by_identity(identity)
        .await
        .map_err(|e| ApiError::Upstream(e.to_string()))?;
    let Some(row) = rows.into_iter().next() else {
        return Err(ApiError::NotFound(format!(
            "no record for tmdb_id={} type={}",
            query.tmdb_id, kind
        ))
        .into());
    };

    let country = query.country.unwrap_or_else(|| "us".to_string());
    let language = query.language.unwrap_or_else(|| "en".to_string());
    let availability = match state
        .availability
        .availability_details(kind, query.tmdb_id, &country, &language)
        .await
    {
        Ok(data) => data,
        Err(e) => {
            warn!(tmdb_id = query.tmdb_id, error = %e, "availability lookup failed");
            Value::Null
        }
    };

    Ok(Json(json!({
        "record": row.columns,
        "country": country,
        "availability": availability,
    })))
}
