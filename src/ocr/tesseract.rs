use std::process::Command;

use anyhow::{Context, Result, bail};
use image::{ImageFormat, RgbaImage};
use tracing::debug;

use super::{OcrBox, OcrEngine, OcrLine, OcrWord};
use crate::util::{ScratchFile, command_available, scratch_path};

const TSV_WORD_LEVEL: u32 = 5;
const TSV_COLUMNS: usize = 12;

pub struct TesseractCli {
    language: String,
    page_segmentation_mode: u32,
    bands_recognized: usize,
}

impl TesseractCli {
    pub fn new(language: &str, page_segmentation_mode: u32) -> Result<Self> {
        if !command_available("tesseract") {
            bail!("tesseract is not available on PATH");
        }

        Ok(Self {
            language: language.to_string(),
            page_segmentation_mode,
            bands_recognized: 0,
        })
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(&mut self, band: &RgbaImage) -> Result<Vec<OcrLine>> {
        let png = ScratchFile::new(scratch_path(
            &format!("band{}", self.bands_recognized),
            ".png",
        ));
        band.save_with_format(png.path(), ImageFormat::Png)
            .with_context(|| format!("failed to write band image {}", png.path().display()))?;

        let output = Command::new("tesseract")
            .arg(png.path())
            .arg("stdout")
            .arg("-l")
            .arg(&self.language)
            .arg("--psm")
            .arg(self.page_segmentation_mode.to_string())
            .arg("tsv")
            .output()
            .with_context(|| format!("failed to execute tesseract for {}", png.path().display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "tesseract returned non-zero exit status for band {}: {}",
                self.bands_recognized,
                stderr.trim()
            );
        }

        self.bands_recognized += 1;
        parse_tesseract_tsv(&String::from_utf8_lossy(&output.stdout))
    }

    fn reset(&mut self) {
        debug!(bands = self.bands_recognized, "tesseract session released");
    }
}

pub fn parse_tesseract_tsv(raw: &str) -> Result<Vec<OcrLine>> {
    let mut lines = Vec::<OcrLine>::new();
    let mut current_key: Option<(u32, u32, u32, u32)> = None;

    for (index, row) in raw.lines().enumerate() {
        if index == 0 && row.starts_with("level") {
            continue;
        }
        if row.trim().is_empty() {
            continue;
        }

        let fields = row.splitn(TSV_COLUMNS, '\t').collect::<Vec<&str>>();
        if fields.len() < TSV_COLUMNS - 1 {
            bail!("malformed tesseract tsv row {}: {row}", index + 1);
        }

        let level = parse_field::<u32>(&fields, 0, index)?;
        if level != TSV_WORD_LEVEL {
            continue;
        }

        let text = fields.get(11).map(|value| value.trim()).unwrap_or_default();
        if text.is_empty() {
            continue;
        }

        let key = (
            parse_field::<u32>(&fields, 1, index)?,
            parse_field::<u32>(&fields, 2, index)?,
            parse_field::<u32>(&fields, 3, index)?,
            parse_field::<u32>(&fields, 4, index)?,
        );
        let left = parse_field::<i32>(&fields, 6, index)?;
        let top = parse_field::<i32>(&fields, 7, index)?;
        let width = parse_field::<i32>(&fields, 8, index)?;
        let height = parse_field::<i32>(&fields, 9, index)?;
        let confidence = parse_field::<f64>(&fields, 10, index)?.clamp(0.0, 100.0);

        if current_key != Some(key) {
            lines.push(OcrLine::default());
            current_key = Some(key);
        }

        if let Some(line) = lines.last_mut() {
            line.words.push(OcrWord {
                text: text.to_string(),
                confidence,
                choice_count: 1,
                bbox: OcrBox {
                    x0: left,
                    y0: top,
                    x1: left + width,
                    y1: top + height,
                },
            });
        }
    }

    Ok(lines)
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    column: usize,
    row_index: usize,
) -> Result<T> {
    let raw = fields
        .get(column)
        .map(|value| value.trim())
        .unwrap_or_default();
    raw.parse::<T>().ok().with_context(|| {
        format!(
            "invalid value '{raw}' in tesseract tsv column {column} on row {}",
            row_index + 1
        )
    })
}
