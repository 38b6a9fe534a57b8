use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use image::RgbaImage;
use tracing::debug;

use crate::util::{ScratchDir, command_available};

const IMAGE_PREFIX: &str = "img";

/// Images extracted from one PDF. The backing scratch directory is removed
/// when this value drops.
pub struct ExtractedImages {
    _scratch: ScratchDir,
    paths: Vec<PathBuf>,
}

impl ExtractedImages {
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

pub fn extract_page_images(pdf_path: &Path, scratch: ScratchDir) -> Result<ExtractedImages> {
    if !command_available("pdfimages") {
        bail!("pdfimages is not available on PATH; install poppler-utils");
    }

    let output_root = scratch.path().join(IMAGE_PREFIX);
    let output = Command::new("pdfimages")
        .arg("-png")
        .arg("-p")
        .arg(pdf_path)
        .arg(&output_root)
        .output()
        .with_context(|| format!("failed to execute pdfimages for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdfimages returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let mut paths = Vec::new();
    for entry in fs::read_dir(scratch.path())
        .with_context(|| format!("failed to list {}", scratch.path().display()))?
    {
        let path = entry?.path();
        if is_image_path(&path) {
            paths.push(path);
        }
    }
    paths.sort_by_key(|path| image_order_key(path));

    debug!(pdf = %pdf_path.display(), images = paths.len(), "extracted embedded images");

    Ok(ExtractedImages {
        _scratch: scratch,
        paths,
    })
}

pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let image =
        image::open(path).with_context(|| format!("failed to decode image {}", path.display()))?;
    Ok(image.to_rgba8())
}

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|extension| {
            matches!(
                extension.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg"
            )
        })
}

/// `pdfimages -p` names files `<prefix>-<page>-<index>.png`; page numbers are
/// only zero-padded to three digits, so a plain name sort breaks past 999.
fn image_order_key(path: &Path) -> (u32, u32, String) {
    let stem = path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or_default();
    let mut numbers = stem.rsplit('-').map(|part| part.parse::<u32>().ok());
    let index = numbers.next().flatten();
    let page = numbers.next().flatten();

    match (page, index) {
        (Some(page), Some(index)) => (page, index, stem.to_string()),
        _ => (u32::MAX, u32::MAX, stem.to_string()),
    }
}
