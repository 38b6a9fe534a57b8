use serde::{Deserialize, Serialize};

use crate::config::PipelineConfig;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub record_number: String,
    pub address: String,
    pub street_name: String,
    pub suburb: String,
    pub description: String,
    pub applicant: String,
    pub source_url: String,
    pub comment_address: String,
    pub scrape_date: String,
    pub received_date: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub url: String,
    pub title: String,
    pub sha256: String,
    pub image_count: usize,
    pub record_count: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapeCounts {
    pub documents_found: usize,
    pub documents_processed: usize,
    pub images_processed: usize,
    pub images_without_columns: usize,
    pub bands_processed: usize,
    pub lines_recognized: usize,
    pub rows_assembled: usize,
    pub rows_rejected: usize,
    pub rows_merged: usize,
    pub records_accepted: usize,
    pub records_rejected: usize,
    pub records_inserted: usize,
    pub records_already_present: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub listing_url: String,
    pub db_path: String,
    pub dry_run: bool,
    pub config: PipelineConfig,
    pub counts: ScrapeCounts,
    pub documents: Vec<DocumentEntry>,
    pub warnings: Vec<String>,
}
