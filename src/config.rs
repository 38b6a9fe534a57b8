use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::VocabularyArgs;

/// Tunables for the table reconstruction pipeline. Pixel values are in
/// original-image coordinates, i.e. after OCR boxes are scaled back down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub upscale_factor: u32,
    pub section_height: u32,
    pub section_step: u32,
    pub column_gap: u32,
    pub column_alignment: u32,
    pub line_alignment: u32,
    pub dark_channel_threshold: u8,
    pub dark_alpha_threshold: u8,
    pub row_min_confidence: f64,
    pub record_number_min_confidence: f64,
    pub address_min_confidence: f64,
    pub suburb_max_distance: usize,
    pub street_max_distance: usize,
    pub suburb_max_tokens: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            upscale_factor: 3,
            section_height: 60,
            section_step: 10,
            column_gap: 20,
            column_alignment: 10,
            line_alignment: 5,
            dark_channel_threshold: 100,
            dark_alpha_threshold: 127,
            row_min_confidence: 60.0,
            record_number_min_confidence: 70.0,
            address_min_confidence: 75.0,
            suburb_max_distance: 2,
            street_max_distance: 3,
            suburb_max_tokens: 5,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let raw =
                    fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
                let config: PipelineConfig = serde_json::from_slice(&raw)
                    .with_context(|| format!("failed to parse {}", path.display()))?;
                info!(path = %path.display(), "loaded pipeline config");
                config
            }
            None => PipelineConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.upscale_factor == 0 {
            bail!("upscale_factor must be at least 1");
        }
        if self.section_height == 0 || self.section_step == 0 {
            bail!("section_height and section_step must be at least 1");
        }
        if self.section_step > self.section_height {
            bail!(
                "section_step ({}) must not exceed section_height ({}) or bands would leave gaps",
                self.section_step,
                self.section_height
            );
        }
        if self.column_gap == 0 {
            bail!("column_gap must be at least 1");
        }
        for (name, value) in [
            ("row_min_confidence", self.row_min_confidence),
            (
                "record_number_min_confidence",
                self.record_number_min_confidence,
            ),
            ("address_min_confidence", self.address_min_confidence),
        ] {
            if !(0.0..=100.0).contains(&value) {
                bail!("{name} must be within 0..=100, got {value}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub canonical: String,
    pub key: String,
}

impl VocabularyEntry {
    pub fn new(canonical: &str) -> Self {
        Self {
            canonical: canonical.to_string(),
            key: canonical.to_uppercase(),
        }
    }
}

/// Known-correct street and suburb names plus literal OCR corrections,
/// loaded once per run and shared read-only by the normalizer.
#[derive(Debug, Clone, Default)]
pub struct ReferenceVocabulary {
    pub street_names: Vec<VocabularyEntry>,
    pub suburb_names: Vec<VocabularyEntry>,
    pub misspellings: HashMap<String, String>,
}

impl ReferenceVocabulary {
    pub fn new<S: AsRef<str>>(
        street_names: &[S],
        suburb_names: &[S],
        misspellings: HashMap<String, String>,
    ) -> Self {
        Self {
            street_names: street_names
                .iter()
                .map(|name| VocabularyEntry::new(name.as_ref()))
                .collect(),
            suburb_names: suburb_names
                .iter()
                .map(|name| VocabularyEntry::new(name.as_ref()))
                .collect(),
            misspellings,
        }
    }

    pub fn load(args: &VocabularyArgs) -> Result<Self> {
        let street_names = read_name_list(&args.street_names)?;
        let suburb_names = read_name_list(&args.suburb_names)?;

        let raw = fs::read(&args.misspellings)
            .with_context(|| format!("failed to read {}", args.misspellings.display()))?;
        let misspellings: HashMap<String, String> = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", args.misspellings.display()))?;

        if suburb_names.is_empty() {
            bail!(
                "suburb vocabulary is empty: {}",
                args.suburb_names.display()
            );
        }

        info!(
            streets = street_names.len(),
            suburbs = suburb_names.len(),
            misspellings = misspellings.len(),
            "loaded reference vocabulary"
        );

        Ok(Self::new(&street_names, &suburb_names, misspellings))
    }
}

fn read_name_list(path: &Path) -> Result<Vec<String>> {
    let raw =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(parse_name_list(&raw))
}

pub fn parse_name_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split(',').next())
        .map(|name| name.split_whitespace().collect::<Vec<&str>>().join(" "))
        .filter(|name| !name.is_empty())
        .collect()
}
