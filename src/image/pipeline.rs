// src/image/pipeline.rs

//! Icon derivation and shared raster operations
//!
//! The rules here keep output deterministic and honest about fidelity:
//! sources below the configured minimum are rejected instead of upscaled,
//! sources that already fit are padded instead of resampled, and vector
//! sources are rendered directly at target resolution.

use crate::image::xpm;
use image::imageops::FilterType;
use image::{imageops, Rgba, RgbaImage};
use resvg::{tiny_skia, usvg};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Why icon derivation failed
///
/// Every variant rejects the owning application only; none is fatal to the
/// package.
#[derive(Error, Debug)]
pub enum IconError {
    #[error("icon too small to process ({width}x{height}, minimum {min})")]
    TooSmall { width: u32, height: u32, min: u32 },

    #[error("unsupported icon format: {0}")]
    Unsupported(String),

    #[error("failed to decode icon: {0}")]
    Decode(String),

    #[error("failed to render SVG: {0}")]
    Svg(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl From<image::ImageError> for IconError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Derive a `size`x`size` PNG icon at `target` from an arbitrary source
pub fn derive_icon(
    source: &Path,
    target: &Path,
    size: u32,
    min_size: u32,
) -> Result<(), IconError> {
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let output = match ext.as_str() {
        "svg" => render_svg(source, size)?,
        "png" | "gif" | "ico" | "xpm" => {
            let img = load_raster(source, &ext)?;
            let (width, height) = img.dimensions();
            if width < min_size || height < min_size {
                return Err(IconError::TooSmall {
                    width,
                    height,
                    min: min_size,
                });
            }
            if width <= size && height <= size {
                // already fits: pad, never resample
                center_on_canvas(&img, size, Rgba([0, 0, 0, 0]))
            } else {
                imageops::resize(&img, size, size, FilterType::Lanczos3)
            }
        }
        other => return Err(IconError::Unsupported(other.to_string())),
    };

    debug!(target = %target.display(), "writing derived icon");
    output.save(target)?;
    Ok(())
}

fn load_raster(path: &Path, ext: &str) -> Result<RgbaImage, IconError> {
    if ext == "xpm" {
        let text = fs::read_to_string(path)?;
        return xpm::decode(&text).map_err(IconError::Decode);
    }
    Ok(image::open(path)?.to_rgba8())
}

/// Render an SVG at exactly `size`x`size`, scaled to fit
fn render_svg(path: &Path, size: u32) -> Result<RgbaImage, IconError> {
    let data = fs::read(path)?;
    let opt = usvg::Options::default();
    let tree = usvg::Tree::from_data(&data, &opt).map_err(|e| IconError::Svg(e.to_string()))?;

    let mut pixmap =
        tiny_skia::Pixmap::new(size, size).ok_or_else(|| IconError::Svg("zero canvas".into()))?;
    let native = tree.size();
    let scale = f32::min(size as f32 / native.width(), size as f32 / native.height());
    let transform = tiny_skia::Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());
    Ok(pixmap_to_image(&pixmap))
}

/// Center an image on a square canvas of `size` filled with `background`
pub fn center_on_canvas(img: &RgbaImage, size: u32, background: Rgba<u8>) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(size, size, background);
    let (w, h) = img.dimensions();
    let off_x = (size.saturating_sub(w)) / 2;
    let off_y = (size.saturating_sub(h)) / 2;
    imageops::overlay(&mut canvas, img, off_x as i64, off_y as i64);
    canvas
}

/// Crop to the tight bounding box of non-background pixels
///
/// With `background = None` any pixel with nonzero alpha counts as content.
/// Returns `None` when the image has no content at all.
pub fn autocrop(img: &RgbaImage, background: Option<Rgba<u8>>) -> Option<RgbaImage> {
    let (width, height) = img.dimensions();
    let is_content = |px: &Rgba<u8>| match background {
        Some(bg) => px != &bg,
        None => px[3] != 0,
    };

    let mut min_x = width;
    let mut min_y = height;
    let mut max_x = 0u32;
    let mut max_y = 0u32;
    for (x, y, px) in img.enumerate_pixels() {
        if is_content(px) {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
    }
    if min_x > max_x || min_y > max_y {
        return None;
    }
    Some(
        imageops::crop_imm(img, min_x, min_y, max_x - min_x + 1, max_y - min_y + 1).to_image(),
    )
}

/// Scale to a target width, preserving aspect ratio
pub fn scale_to_width(img: &RgbaImage, width: u32) -> RgbaImage {
    let (w, h) = img.dimensions();
    if w == width {
        return img.clone();
    }
    let height = ((h as f64 * width as f64 / w as f64).round() as u32).max(1);
    imageops::resize(img, width, height, FilterType::Lanczos3)
}

/// Convert a tiny-skia pixmap (premultiplied) into an `RgbaImage`
pub fn pixmap_to_image(pixmap: &tiny_skia::Pixmap) -> RgbaImage {
    let mut out = RgbaImage::new(pixmap.width(), pixmap.height());
    for (px, dst) in pixmap.pixels().iter().zip(out.pixels_mut()) {
        let c = px.demultiply();
        *dst = Rgba([c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
