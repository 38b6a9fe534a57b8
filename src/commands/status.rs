use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::DEFAULT_DB_FILE;
use crate::cli::StatusArgs;
use crate::model::ScrapeRunManifest;
use crate::store::{count_records, latest_scrape_date, metadata_value, open_store};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILE));

    info!(cache_root = %args.cache_root.display(), "status requested");

    match latest_manifest_path(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: ScrapeRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                status = %manifest.status,
                started_at = %manifest.started_at,
                updated_at = %manifest.updated_at,
                listing_url = %manifest.listing_url,
                dry_run = manifest.dry_run,
                documents = manifest.counts.documents_processed,
                images = manifest.counts.images_processed,
                images_without_columns = manifest.counts.images_without_columns,
                records_accepted = manifest.counts.records_accepted,
                records_inserted = manifest.counts.records_inserted,
                warnings = manifest.warnings.len(),
                "loaded latest scrape manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no scrape manifest found"),
    }

    if db_path.exists() {
        let connection = open_store(&db_path)?;
        let records = count_records(&connection)?;
        let latest = latest_scrape_date(&connection)?.unwrap_or_default();
        let updated_at = metadata_value(&connection, "db_updated_at")?.unwrap_or_default();

        info!(
            path = %db_path.display(),
            records,
            latest_scrape_date = %latest,
            updated_at = %updated_at,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Manifest names embed a compact UTC stamp, so the lexically greatest name
/// is the most recent run.
fn latest_manifest_path(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let is_manifest = path
            .file_name()
            .and_then(|value| value.to_str())
            .is_some_and(|name| name.starts_with("scrape_run_") && name.ends_with(".json"));
        if !is_manifest {
            continue;
        }
        if latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
