use std::{
    fs,
    path::{Path, PathBuf},
};

use image::ImageFormat;
use tracing::info;

use crate::{error::ExportError, presentation::Canvas};

pub const EXPORT_EXTENSION: &str = "png";

/// `image_<sampleCount>_spp.<ext>`. Before any telemetry arrives the count is
/// blank, giving `image__spp.<ext>`.
pub fn export_file_name(sample_count: Option<usize>, extension: &str) -> String {
    let sample_count = sample_count.map(|n| n.to_string()).unwrap_or_default();
    format!("image_{sample_count}_spp.{extension}")
}

/// Writes the current canvas as PNG into `dir`, named after the displayed
/// sample count.
pub fn save_png(canvas: &Canvas, dir: &Path) -> Result<PathBuf, ExportError> {
    let pixels = canvas.pixels();
    if pixels.width() == 0 || pixels.height() == 0 {
        return Err(ExportError::EmptyCanvas);
    }

    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.display().to_string(),
        source,
    })?;
    let path = dir.join(export_file_name(canvas.sample_count(), EXPORT_EXTENSION));
    pixels.save_with_format(&path, ImageFormat::Png)?;
    info!(path = %path.display(), "canvas exported");
    Ok(path)
}
