// src/model/screenshot.rs

//! Derived screenshot assets
//!
//! A [`Screenshot`] owns its decoded source raster. Thumbnails are not kept in
//! memory; the serializer asks for each configured size at output time.

use crate::error::Result;
use image::imageops::FilterType;
use image::{imageops, Rgba, RgbaImage};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// A screenshot waiting to be materialized
#[derive(Debug, Clone)]
pub struct Screenshot {
    image: RgbaImage,
    /// Native width of the untransformed source
    pub width: u32,
    /// Native height of the untransformed source
    pub height: u32,
    /// Content-derived output filename, `<id>-<hash>.png`
    pub basename: String,
    pub caption: Option<String>,
}

impl Screenshot {
    /// Wrap a decoded image, deriving the content-addressed basename
    ///
    /// The basename hashes the decoded RGBA pixels, not the encoded bytes, so
    /// regenerating from identical input yields an identical name regardless
    /// of encoder version. Byte-identical PNG output is not promised.
    pub fn new(app_id: &str, image: RgbaImage, caption: Option<String>) -> Self {
        let (width, height) = image.dimensions();
        let basename = format!("{}-{}.png", app_id, content_hash(&image));
        Self {
            image,
            width,
            height,
            basename,
            caption,
        }
    }

    /// Write the untransformed source image into `dir`
    pub fn write_source(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.basename);
        self.image.save(&path)?;
        Ok(path)
    }

    /// Write one thumbnail of exactly `width`x`height` into `dir`
    ///
    /// The source is scaled to fit while preserving aspect ratio; any
    /// remaining area is transparent padding, never a stretch.
    pub fn write_thumbnail(&self, dir: &Path, (width, height): (u32, u32)) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.basename);

        let scale = f64::min(
            width as f64 / self.width as f64,
            height as f64 / self.height as f64,
        )
        .min(1.0);
        let fit_w = ((self.width as f64 * scale).round() as u32).max(1);
        let fit_h = ((self.height as f64 * scale).round() as u32).max(1);

        let scaled = imageops::resize(&self.image, fit_w, fit_h, FilterType::Lanczos3);
        if (fit_w, fit_h) == (width, height) {
            scaled.save(&path)?;
            return Ok(path);
        }

        let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
        let off_x = (width - fit_w) / 2;
        let off_y = (height - fit_h) / 2;
        imageops::overlay(&mut canvas, &scaled, off_x as i64, off_y as i64);
        canvas.save(&path)?;
        Ok(path)
    }
}

/// Stable hex digest of the raw pixel content
fn content_hash(image: &RgbaImage) -> String {
    let mut hasher = Sha256::new();
    hasher.update(image.as_raw());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(32);
    for byte in &digest[..16] {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}
