use std::collections::HashMap;

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use super::{Bounds, Line, Word};
use crate::config::PipelineConfig;
use crate::ocr::OcrLine;

pub(super) struct Band {
    pub top: u32,
    pub image: RgbaImage,
}

/// Overwrites near-full-width dark rows (table rulings) with the dominant
/// color of the row above. Returns the number of rows overwritten.
pub(super) fn remove_horizontal_rules(image: &mut RgbaImage, config: &PipelineConfig) -> usize {
    let (width, height) = image.dimensions();
    let rule_threshold = width.saturating_sub(2 * config.column_gap) as usize;
    let mut previous_dominant: Option<Rgba<u8>> = None;
    let mut removed = 0;

    for y in 0..height {
        let dark_count = (0..width)
            .filter(|&x| is_dark(image.get_pixel(x, y), config))
            .count();

        if dark_count > rule_threshold
            && let Some(fill) = previous_dominant
        {
            for x in 0..width {
                image.put_pixel(x, y, fill);
            }
            removed += 1;
            continue;
        }

        previous_dominant = dominant_color(image, y);
    }

    removed
}

fn is_dark(pixel: &Rgba<u8>, config: &PipelineConfig) -> bool {
    let [red, green, blue, alpha] = pixel.0;
    red < config.dark_channel_threshold
        && green < config.dark_channel_threshold
        && blue < config.dark_channel_threshold
        && alpha > config.dark_alpha_threshold
}

fn dominant_color(image: &RgbaImage, y: u32) -> Option<Rgba<u8>> {
    let mut histogram = HashMap::<[u8; 4], usize>::new();
    for x in 0..image.width() {
        *histogram.entry(image.get_pixel(x, y).0).or_default() += 1;
    }

    histogram
        .into_iter()
        .max_by(|left, right| left.1.cmp(&right.1).then_with(|| right.0.cmp(&left.0)))
        .map(|(color, _)| Rgba(color))
}

pub(super) fn band_tops(height: u32, config: &PipelineConfig) -> Vec<u32> {
    let mut tops = Vec::new();
    let mut top = 0;
    while top < height {
        tops.push(top);
        if top + config.section_height >= height {
            break;
        }
        top += config.section_step;
    }
    tops
}

/// Lazily crops and upsamples one band at a time so that only a single
/// band buffer is alive alongside the source image.
pub(super) struct BandWindows<'a> {
    source: &'a RgbaImage,
    config: &'a PipelineConfig,
    tops: std::vec::IntoIter<u32>,
}

impl<'a> BandWindows<'a> {
    pub fn new(source: &'a RgbaImage, config: &'a PipelineConfig) -> Self {
        Self {
            source,
            config,
            tops: band_tops(source.height(), config).into_iter(),
        }
    }
}

impl Iterator for BandWindows<'_> {
    type Item = Band;

    fn next(&mut self) -> Option<Band> {
        let top = self.tops.next()?;
        let width = self.source.width();
        let height = self.config.section_height.min(self.source.height() - top);

        let cropped = imageops::crop_imm(self.source, 0, top, width, height).to_image();
        let factor = self.config.upscale_factor;
        let image = if factor > 1 {
            imageops::resize(
                &cropped,
                width * factor,
                height * factor,
                FilterType::CatmullRom,
            )
        } else {
            cropped
        };

        Some(Band { top, image })
    }
}

pub(super) fn translate_band_lines(
    lines: Vec<OcrLine>,
    band_top: u32,
    upscale_factor: u32,
) -> Vec<Line> {
    let factor = f64::from(upscale_factor.max(1));
    let scale = |value: i32| (f64::from(value) / factor).round() as i32;
    let offset = band_top as i32;

    lines
        .into_iter()
        .filter_map(|line| {
            let mut words = line
                .words
                .into_iter()
                .filter(|word| !word.text.trim().is_empty())
                .map(|word| Word {
                    text: word.text.trim().to_string(),
                    confidence: word.confidence.clamp(0.0, 100.0),
                    choice_count: word.choice_count,
                    bounds: Bounds {
                        x: scale(word.bbox.x0),
                        y: scale(word.bbox.y0) + offset,
                        width: scale(word.bbox.x1 - word.bbox.x0),
                        height: scale(word.bbox.y1 - word.bbox.y0),
                    },
                })
                .collect::<Vec<Word>>();
            if words.is_empty() {
                return None;
            }
            words.sort_by_key(|word| word.bounds.x);
            Some(Line { words })
        })
        .collect()
}
