mod columns;
mod dedup;
mod filter;
mod normalize;
mod rows;
#[cfg(test)]
mod tests;
mod windowing;

use anyhow::{Context, Result};
use image::RgbaImage;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{PipelineConfig, ReferenceVocabulary};
use crate::model::Record;
use crate::ocr::{BandSession, OcrEngine};

use columns::*;
use dedup::*;
use filter::*;
use normalize::*;
use rows::*;
use windowing::*;

pub const COLUMN_COUNT: usize = 5;
pub const FIELD_SEPARATOR: char = '/';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    ReceivedDate,
    RecordNumber,
    Description,
    Applicant,
    Address,
}

impl ColumnKind {
    pub const ALL: [ColumnKind; COLUMN_COUNT] = [
        ColumnKind::ReceivedDate,
        ColumnKind::RecordNumber,
        ColumnKind::Description,
        ColumnKind::Applicant,
        ColumnKind::Address,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Date and record-number tokens are often split by OCR, so their
    /// pieces are glued back together without a space.
    pub fn joiner(self) -> &'static str {
        if self.is_structured() { "" } else { " " }
    }

    pub fn is_structured(self) -> bool {
        matches!(self, Self::ReceivedDate | Self::RecordNumber)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub fn right(&self) -> i32 {
        self.x + self.width
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub confidence: f64,
    pub choice_count: u32,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub x: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    pub y: Option<i32>,
    pub texts: Vec<String>,
    pub confidence: f64,
}

impl Cell {
    pub fn text(&self, kind: ColumnKind) -> String {
        self.texts.join(kind.joiner())
    }

    pub fn is_empty(&self) -> bool {
        self.texts.iter().all(|text| text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub cells: [Cell; COLUMN_COUNT],
}

impl Row {
    pub fn cell(&self, kind: ColumnKind) -> &Cell {
        &self.cells[kind.index()]
    }

    pub fn text(&self, kind: ColumnKind) -> String {
        self.cell(kind).text(kind)
    }

    pub fn y(&self) -> Option<i32> {
        self.cells[0].y
    }
}

#[derive(Debug, Clone)]
pub struct RecordContext {
    pub source_url: String,
    pub comment_address: String,
    pub scrape_date: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImageStats {
    pub rules_removed: usize,
    pub bands: usize,
    pub lines: usize,
    pub columns_found: bool,
    pub rows_assembled: usize,
    pub rows_rejected: usize,
    pub rows_merged: usize,
    pub records_accepted: usize,
    pub records_rejected: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ImageOutcome {
    pub records: Vec<Record>,
    pub stats: ImageStats,
}

pub struct TablePipeline<'a> {
    config: &'a PipelineConfig,
    vocabulary: &'a ReferenceVocabulary,
    filter: RecordFilter,
}

impl<'a> TablePipeline<'a> {
    pub fn new(config: &'a PipelineConfig, vocabulary: &'a ReferenceVocabulary) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            vocabulary,
            filter: RecordFilter::new(config)?,
        })
    }

    /// Runs one table image through windowing, OCR and reconstruction.
    /// Bands are recognized strictly one after another; each band buffer and
    /// engine session is released before the next band is cropped.
    pub fn process_image<E: OcrEngine + ?Sized>(
        &self,
        mut image: RgbaImage,
        engine: &mut E,
        context: &RecordContext,
    ) -> Result<ImageOutcome> {
        let mut stats = ImageStats {
            rules_removed: remove_horizontal_rules(&mut image, self.config),
            ..ImageStats::default()
        };

        let mut lines = Vec::<Line>::new();
        for band in BandWindows::new(&image, self.config) {
            let recognized = {
                let mut session = BandSession::begin(&mut *engine);
                session
                    .recognize(&band.image)
                    .with_context(|| format!("OCR failed for band at y={}", band.top))?
            };

            let band_lines = translate_band_lines(recognized, band.top, self.config.upscale_factor);
            debug!(
                band_top = band.top,
                lines = band_lines.len(),
                "recognized band"
            );
            stats.bands += 1;
            lines.extend(band_lines);
        }
        drop(image);

        Ok(self.reconstruct(&lines, context, stats))
    }

    pub fn reconstruct(
        &self,
        lines: &[Line],
        context: &RecordContext,
        mut stats: ImageStats,
    ) -> ImageOutcome {
        stats.lines = lines.len();

        let Some(columns) = locate_columns(lines, self.config) else {
            warn!(
                lines = lines.len(),
                expected_columns = COLUMN_COUNT,
                "could not locate table columns; image yields no records"
            );
            return ImageOutcome {
                records: Vec::new(),
                stats,
            };
        };
        stats.columns_found = true;
        debug!(columns = ?columns, "located table columns");

        let mut rows = Vec::<Row>::new();
        for line in lines {
            let row = assemble_row(line, &columns, self.config);
            match accept_row(&row, self.config) {
                Ok(()) => rows.push(row),
                Err(reason) => {
                    stats.rows_rejected += 1;
                    debug!(reason = ?reason, "dropped assembled row");
                }
            }
        }
        stats.rows_assembled = rows.len();

        let merged = deduplicate_rows(rows, self.config);
        stats.rows_merged = merged.len();

        let mut records = Vec::<Record>::new();
        for row in merged {
            let address =
                normalize_address(&row.text(ColumnKind::Address), self.vocabulary, self.config);
            match self.filter.evaluate(&row, &address) {
                Ok(()) => records.push(self.build_record(&row, address, context)),
                Err(reason) => {
                    stats.records_rejected += 1;
                    debug!(
                        record_number = %row.text(ColumnKind::RecordNumber),
                        reason = ?reason,
                        "dropped merged row"
                    );
                }
            }
        }
        stats.records_accepted = records.len();

        info!(
            rules_removed = stats.rules_removed,
            bands = stats.bands,
            lines = stats.lines,
            rows = stats.rows_assembled,
            merged = stats.rows_merged,
            records = stats.records_accepted,
            "reconstructed table image"
        );

        ImageOutcome { records, stats }
    }

    fn build_record(
        &self,
        row: &Row,
        address: NormalizedAddress,
        context: &RecordContext,
    ) -> Record {
        Record {
            record_number: row.text(ColumnKind::RecordNumber).trim().to_string(),
            address: address.text,
            street_name: address.street.unwrap_or_default(),
            suburb: address.suburb.unwrap_or_default(),
            description: correct_free_text(
                row.text(ColumnKind::Description).trim(),
                &self.vocabulary.misspellings,
            ),
            applicant: row.text(ColumnKind::Applicant).trim().to_string(),
            source_url: context.source_url.clone(),
            comment_address: context.comment_address.clone(),
            scrape_date: context.scrape_date.clone(),
            received_date: normalize_received_date(&row.text(ColumnKind::ReceivedDate)),
        }
    }
}
