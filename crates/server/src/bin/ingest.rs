//! Bulk ingestion driver: one `UpsertPipeline::run` per requested kind.
//!
//! Usage: `mf-ingest [movie] [series] [artist]` — defaults to all three.

use anyhow::Context;
use moviefinder_catalog::{CatalogClient, CatalogConfig};
use moviefinder_core::types::CatalogRecordType;
use moviefinder_ingest::UpsertPipeline;
use moviefinder_server::config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::init()?;

    let kinds = requested_kinds()?;

    let catalog = CatalogClient::connect(CatalogConfig {
        api_key: config::require_env("TMDB_AUTH")?,
    })
    .await
    .context("failed to connect to catalog API")?;

    let store_config = moviefinder_store::StoreConfig::new(
        config::require_env("SUPA_BASE_URL")?,
        config::require_env("SUPA_AUTH_TOKEN")?,
    );
    let store = moviefinder_store::SupabaseStore::connect(store_config)
        .await
        .context("failed to connect to store")?;

    let pipeline = UpsertPipeline::new(store);

    let mut aborted_runs = 0usize;
    for kind in kinds {
        info!(kind = %kind, "starting ingestion run");
        match pipeline.run(&catalog, kind).await {
            Ok(report) => {
                info!(
                    kind = %kind,
                    inserted = report.inserted,
                    skipped_duplicate = report.skipped_duplicate,
                    skipped_malformed = report.skipped_malformed,
                    failed = report.failed,
                    "ingestion run finished"
                );
                for item in &report.failed_items {
                    error!(
                        catalog_id = item.catalog_id,
                        kind = %item.record_type,
                        reason = %item.reason,
                        "record failed, retry out of band"
                    );
                }
            }
            Err(e) => {
                error!(kind = %kind, error = %e, "ingestion run aborted");
                aborted_runs += 1;
            }
        }
    }

    if aborted_runs > 0 {
        anyhow::bail!("{aborted_runs} ingestion run(s) aborted");
    }
    Ok(())
}

fn requested_kinds() -> anyhow::Result<Vec<CatalogRecordType>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return Ok(vec![
            CatalogRecordType::Movie,
            CatalogRecordType::Series,
            CatalogRecordType::Artist,
        ]);
    }
    args.iter()
        .map(|arg| {
            arg.parse::<CatalogRecordType>()
                .map_err(|e| anyhow::anyhow!(e))
        })
        .collect()
}
