pub mod extract;
pub mod scrape;
pub mod status;

use std::path::Path;

use anyhow::Result;
use tracing::warn;

use crate::model::{Record, ScrapeCounts};
use crate::ocr::OcrEngine;
use crate::source::load_image;
use crate::table::{ImageStats, RecordContext, TablePipeline};

pub(crate) const DEFAULT_DB_FILE: &str = "permits.sqlite";

/// Decodes one table image, runs it through the pipeline and folds the
/// image counters into the run totals. The decoded raster is consumed.
fn process_image_file<E: OcrEngine + ?Sized>(
    pipeline: &TablePipeline<'_>,
    engine: &mut E,
    path: &Path,
    context: &RecordContext,
    counts: &mut ScrapeCounts,
    warnings: &mut Vec<String>,
) -> Result<Vec<Record>> {
    let image = load_image(path)?;
    let outcome = pipeline.process_image(image, engine, context)?;

    absorb_image_stats(counts, &outcome.stats);
    if !outcome.stats.columns_found {
        warn!(
            source = %context.source_url,
            image = %path.display(),
            "image yielded no table columns"
        );
        warnings.push(format!(
            "no table columns found in {} ({})",
            context.source_url,
            path.file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        ));
    }

    Ok(outcome.records)
}

fn absorb_image_stats(counts: &mut ScrapeCounts, stats: &ImageStats) {
    counts.images_processed += 1;
    if !stats.columns_found {
        counts.images_without_columns += 1;
    }
    counts.bands_processed += stats.bands;
    counts.lines_recognized += stats.lines;
    counts.rows_assembled += stats.rows_assembled;
    counts.rows_rejected += stats.rows_rejected;
    counts.rows_merged += stats.rows_merged;
    counts.records_accepted += stats.records_accepted;
    counts.records_rejected += stats.records_rejected;
}
