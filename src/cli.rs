use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "permit-ocr",
    version,
    about = "Recover permit filing records from scanned table images in published PDFs"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Scrape(ScrapeArgs),
    Extract(ExtractArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct VocabularyArgs {
    #[arg(long, default_value = "reference/street_names.txt")]
    pub street_names: PathBuf,

    #[arg(long, default_value = "reference/suburb_names.txt")]
    pub suburb_names: PathBuf,

    #[arg(long, default_value = "reference/misspellings.json")]
    pub misspellings: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct OcrArgs {
    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 6)]
    pub ocr_psm: u32,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScrapeArgs {
    #[arg(long)]
    pub listing_url: String,

    #[arg(long, default_value = ".cache/permit-ocr")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value = "")]
    pub comment_address: String,

    #[arg(long)]
    pub max_documents: Option<usize>,

    #[arg(long, default_value_t = 60)]
    pub http_timeout_secs: u64,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    #[command(flatten)]
    pub vocabulary: VocabularyArgs,

    #[command(flatten)]
    pub ocr: OcrArgs,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub source_url: Option<String>,

    #[arg(long, default_value = "")]
    pub comment_address: String,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[command(flatten)]
    pub vocabulary: VocabularyArgs,

    #[command(flatten)]
    pub ocr: OcrArgs,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/permit-ocr")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
