use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use super::process_image_file;
use crate::cli::ExtractArgs;
use crate::config::{PipelineConfig, ReferenceVocabulary};
use crate::model::{Record, ScrapeCounts};
use crate::ocr::TesseractCli;
use crate::source::{extract_page_images, is_image_path};
use crate::store::{insert_records, open_store};
use crate::table::{RecordContext, TablePipeline};
use crate::util::{ScratchDir, today_utc_string, write_json_pretty};

pub fn run(args: ExtractArgs) -> Result<()> {
    for input in &args.inputs {
        if !input.is_file() {
            bail!("input not found: {}", input.display());
        }
        if !is_pdf_path(input) && !is_image_path(input) {
            bail!(
                "unsupported input {}: expected a PDF or a PNG/JPEG image",
                input.display()
            );
        }
    }

    let config = PipelineConfig::load(args.ocr.config.as_deref())?;
    let vocabulary = ReferenceVocabulary::load(&args.vocabulary)?;
    let pipeline = TablePipeline::new(&config, &vocabulary)?;
    let mut engine = TesseractCli::new(&args.ocr.ocr_lang, args.ocr.ocr_psm)?;

    let scrape_date = today_utc_string();
    let mut counts = ScrapeCounts {
        documents_found: args.inputs.len(),
        ..ScrapeCounts::default()
    };
    let mut warnings = Vec::<String>::new();
    let mut records = Vec::<Record>::new();

    for input in &args.inputs {
        let context = RecordContext {
            source_url: args
                .source_url
                .clone()
                .unwrap_or_else(|| input.display().to_string()),
            comment_address: args.comment_address.clone(),
            scrape_date: scrape_date.clone(),
        };

        if is_pdf_path(input) {
            let images = extract_page_images(input, ScratchDir::create("images")?)?;
            for path in images.paths() {
                records.extend(process_image_file(
                    &pipeline,
                    &mut engine,
                    path,
                    &context,
                    &mut counts,
                    &mut warnings,
                )?);
            }
        } else {
            records.extend(process_image_file(
                &pipeline,
                &mut engine,
                input,
                &context,
                &mut counts,
                &mut warnings,
            )?);
        }
        counts.documents_processed += 1;
    }

    let records = keep_first_per_record_number(records);

    if let Some(db_path) = &args.db_path {
        let mut connection = open_store(db_path)?;
        let (inserted, already_present) = insert_records(&mut connection, &records)?;
        counts.records_inserted = inserted;
        counts.records_already_present = already_present;
    }

    match &args.output {
        Some(path) => write_json_pretty(path, &records)?,
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut output, &records)
                .context("failed to serialize records json output")?;
            writeln!(output)?;
            output.flush()?;
        }
    }

    for warning in &warnings {
        warn!(warning = %warning, "extract warning");
    }
    info!(
        inputs = counts.documents_processed,
        images = counts.images_processed,
        records = records.len(),
        rejected = counts.records_rejected,
        inserted = counts.records_inserted,
        "extract completed"
    );

    Ok(())
}

fn is_pdf_path(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("pdf"))
}

/// Records from several inputs share one output; the first occurrence of a
/// record number wins, matching the keyed insert in the store.
fn keep_first_per_record_number(records: Vec<Record>) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.record_number.clone()))
        .collect()
}
