use std::fs;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use super::{DEFAULT_DB_FILE, process_image_file};
use crate::cli::ScrapeArgs;
use crate::config::{PipelineConfig, ReferenceVocabulary};
use crate::model::{DocumentEntry, ScrapeCounts, ScrapeRunManifest};
use crate::ocr::TesseractCli;
use crate::source::{
    extract_page_images, extract_pdf_links, fetch_document, fetch_listing, http_client,
};
use crate::store::{insert_records, open_store};
use crate::table::{RecordContext, TablePipeline};
use crate::util::{
    ScratchDir, ScratchFile, ensure_directory, now_utc_string, scratch_path, sha256_bytes,
    today_utc_string, utc_compact_string, write_json_pretty,
};

pub fn run(args: ScrapeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let manifest_dir = args.cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "scrape_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DEFAULT_DB_FILE));

    info!(
        run_id = %run_id,
        listing_url = %args.listing_url,
        dry_run = args.dry_run,
        "starting scrape"
    );

    let config = PipelineConfig::load(args.ocr.config.as_deref())?;
    let vocabulary = ReferenceVocabulary::load(&args.vocabulary)?;
    let pipeline = TablePipeline::new(&config, &vocabulary)?;
    let mut engine = TesseractCli::new(&args.ocr.ocr_lang, args.ocr.ocr_psm)?;

    let client = http_client(args.http_timeout_secs)?;
    let html = fetch_listing(&client, &args.listing_url)?;
    let mut links = extract_pdf_links(&html, &args.listing_url)?;

    let mut counts = ScrapeCounts {
        documents_found: links.len(),
        ..ScrapeCounts::default()
    };
    if let Some(max_documents) = args.max_documents {
        links.truncate(max_documents);
    }
    info!(
        found = counts.documents_found,
        selected = links.len(),
        "discovered permit register documents"
    );

    let mut connection = if args.dry_run {
        None
    } else {
        Some(open_store(&db_path)?)
    };

    let scrape_date = today_utc_string();
    let mut documents = Vec::<DocumentEntry>::new();
    let mut warnings = Vec::<String>::new();

    for link in &links {
        let bytes = fetch_document(&client, &link.url)?;
        let sha256 = sha256_bytes(&bytes);

        let pdf = ScratchFile::new(scratch_path("document", ".pdf"));
        fs::write(pdf.path(), &bytes)
            .with_context(|| format!("failed to write {}", pdf.path().display()))?;
        drop(bytes);

        let images = extract_page_images(pdf.path(), ScratchDir::create("images")?)
            .with_context(|| format!("failed to extract images from {}", link.url))?;

        let context = RecordContext {
            source_url: link.url.clone(),
            comment_address: args.comment_address.clone(),
            scrape_date: scrape_date.clone(),
        };

        let mut records = Vec::new();
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

        if let Some(connection) = connection.as_mut() {
            let (inserted, already_present) = insert_records(connection, &records)?;
            counts.records_inserted += inserted;
            counts.records_already_present += already_present;
        }

        info!(
            url = %link.url,
            images = images.paths().len(),
            records = records.len(),
            "processed document"
        );

        documents.push(DocumentEntry {
            url: link.url.clone(),
            title: link.title.clone(),
            sha256,
            image_count: images.paths().len(),
            record_count: records.len(),
        });
        counts.documents_processed += 1;
    }

    let manifest = ScrapeRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_scrape_command(&args),
        listing_url: args.listing_url.clone(),
        db_path: if args.dry_run {
            String::new()
        } else {
            db_path.display().to_string()
        },
        dry_run: args.dry_run,
        config,
        counts,
        documents,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        documents = manifest.counts.documents_processed,
        records = manifest.counts.records_accepted,
        inserted = manifest.counts.records_inserted,
        already_present = manifest.counts.records_already_present,
        manifest = %manifest_path.display(),
        "scrape completed"
    );

    Ok(())
}

fn render_scrape_command(args: &ScrapeArgs) -> String {
    let mut command = vec![
        "permit-ocr".to_string(),
        "scrape".to_string(),
        "--listing-url".to_string(),
        args.listing_url.clone(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if !args.comment_address.is_empty() {
        command.push("--comment-address".to_string());
        command.push(args.comment_address.clone());
    }
    if let Some(max_documents) = args.max_documents {
        command.push("--max-documents".to_string());
        command.push(max_documents.to_string());
    }
    if args.dry_run {
        command.push("--dry-run".to_string());
    }
    command.push("--ocr-lang".to_string());
    command.push(args.ocr.ocr_lang.clone());
    command.push("--ocr-psm".to_string());
    command.push(args.ocr.ocr_psm.to_string());
    if let Some(path) = &args.ocr.config {
        command.push("--config".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::render_scrape_command;
    use crate::cli::{OcrArgs, ScrapeArgs, VocabularyArgs};

    #[test]
    fn render_scrape_command_includes_optional_flags() {
        let args = ScrapeArgs {
            listing_url: "https://council.example/registers".to_string(),
            cache_root: PathBuf::from(".cache/permit-ocr"),
            db_path: None,
            manifest_path: None,
            comment_address: String::new(),
            max_documents: Some(3),
            http_timeout_secs: 60,
            dry_run: true,
            vocabulary: VocabularyArgs {
                street_names: PathBuf::from("reference/street_names.txt"),
                suburb_names: PathBuf::from("reference/suburb_names.txt"),
                misspellings: PathBuf::from("reference/misspellings.json"),
            },
            ocr: OcrArgs {
                ocr_lang: "eng".to_string(),
                ocr_psm: 6,
                config: Some(PathBuf::from("pipeline.json")),
            },
        };

        let command = render_scrape_command(&args);
        assert!(
            command
                .starts_with("permit-ocr scrape --listing-url https://council.example/registers")
        );
        assert!(command.contains("--max-documents 3"));
        assert!(command.contains("--dry-run"));
        assert!(command.contains("--ocr-psm 6"));
        assert!(command.contains("--config pipeline.json"));
        assert!(!command.contains("--db-path"));
        assert!(!command.contains("--comment-address"));
    }
}
