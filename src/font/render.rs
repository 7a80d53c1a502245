// src/font/render.rs

//! Glyph rasterization: font icons and type specimens
//!
//! Glyph outlines come from `ttf-parser` and are filled with tiny-skia. Text
//! layout is deliberately simple (advance widths only, no kerning or
//! shaping): the output is a recognizable sample, not typography.

use crate::image::pipeline::{autocrop, center_on_canvas, pixmap_to_image, scale_to_width};
use image::imageops::FilterType;
use image::{imageops, Rgba, RgbaImage};
use resvg::tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};
use ttf_parser::{Face, OutlineBuilder};

/// Fixed sample sentence rendered into every font specimen
pub const SPECIMEN_TEXT: &str = "How quickly daft jumping zebras vex.";

/// Point sizes of the three stacked specimen lines, smallest first
const SPECIMEN_SIZES: [f32; 3] = [24.0, 32.0, 40.0];

/// White border re-added around the cropped specimen, in pixels
const SPECIMEN_BORDER: u32 = 12;

struct PathSink {
    builder: PathBuilder,
}

impl PathSink {
    fn new() -> Self {
        Self {
            builder: PathBuilder::new(),
        }
    }
}

impl OutlineBuilder for PathSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

/// Fill `text` at `px` pixels with the pen starting at `(x, baseline_y)`
///
/// Returns the advance width actually consumed. Glyphs without coverage are
/// skipped (callers have already checked coverage for what matters).
fn draw_text(pixmap: &mut Pixmap, face: &Face, text: &str, px: f32, x: f32, baseline_y: f32) -> f32 {
    let scale = px / face.units_per_em() as f32;
    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;

    let mut pen_x = x;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            // unmapped character: advance a third of the size (covers plain spaces
            // in fonts that map them to empty outlines elsewhere)
            pen_x += px / 3.0;
            continue;
        };
        let mut sink = PathSink::new();
        if face.outline_glyph(gid, &mut sink).is_some() {
            if let Some(path) = sink.builder.finish() {
                // font units are y-up; flip around the baseline
                let transform = Transform::from_row(scale, 0.0, 0.0, -scale, pen_x, baseline_y);
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
        pen_x += face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
    }
    pen_x - x
}

/// Render a sample glyph pair as a square icon of `icon_size`
///
/// The pair is drawn large on a transparent canvas, cropped to its tight
/// bounding box, centered on a square canvas and scaled down to the final
/// size. Returns `None` when nothing visible was produced.
pub fn render_icon(face: &Face, sample: &str, icon_size: u32) -> Option<RgbaImage> {
    let px = 160.0;
    let scale = px / face.units_per_em() as f32;
    let baseline = 20.0 + face.ascender() as f32 * scale;

    let mut pixmap = Pixmap::new(640, 320)?;
    draw_text(&mut pixmap, face, sample, px, 20.0, baseline);

    let cropped = autocrop(&pixmap_to_image(&pixmap), None)?;
    let (w, h) = cropped.dimensions();
    let square = center_on_canvas(&cropped, w.max(h), Rgba([0, 0, 0, 0]));
    Some(imageops::resize(
        &square,
        icon_size,
        icon_size,
        FilterType::Lanczos3,
    ))
}

/// Render the multi-size type specimen used as a font screenshot
///
/// The fixed sample sentence is drawn at three increasing sizes stacked
/// vertically on an oversized white canvas, cropped to the non-white bounding
/// box, re-padded with a fixed border and scaled to `target_width`.
pub fn render_specimen(face: &Face, target_width: u32) -> Option<RgbaImage> {
    let mut pixmap = Pixmap::new(1600, 480)?;
    pixmap.fill(Color::WHITE);

    let upem = face.units_per_em() as f32;
    let mut y = 20.0;
    for px in SPECIMEN_SIZES {
        let scale = px / upem;
        y += face.ascender() as f32 * scale;
        draw_text(&mut pixmap, face, SPECIMEN_TEXT, px, 20.0, y);
        y += (-face.descender() as f32) * scale + px * 0.4;
    }

    let white = Rgba([255, 255, 255, 255]);
    let cropped = autocrop(&pixmap_to_image(&pixmap), Some(white))?;
    let (w, h) = cropped.dimensions();
    let mut padded = RgbaImage::from_pixel(
        w + 2 * SPECIMEN_BORDER,
        h + 2 * SPECIMEN_BORDER,
        white,
    );
    imageops::overlay(
        &mut padded,
        &cropped,
        SPECIMEN_BORDER as i64,
        SPECIMEN_BORDER as i64,
    );
    Some(scale_to_width(&padded, target_width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> Vec<u8> {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests/fixtures")
            .join(name);
        std::fs::read(path).unwrap()
    }

    #[test]
    fn specimen_text_is_the_fixed_pangram() {
        assert_eq!(SPECIMEN_TEXT, "How quickly daft jumping zebras vex.");
    }

    #[test]
    fn specimen_sizes_increase() {
        assert!(SPECIMEN_SIZES.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn digit_pair_renders_a_visible_icon() {
        let data = fixture("digit-block.ttf");
        let face = Face::parse(&data, 0).unwrap();
        let icon = render_icon(&face, "12", 64).unwrap();
        assert_eq!(icon.dimensions(), (64, 64));
        assert!(icon.pixels().any(|p| p.0[3] > 0));
    }

    #[test]
    fn specimen_scales_to_the_target_width() {
        let data = fixture("rect-sampler.ttf");
        let face = Face::parse(&data, 0).unwrap();
        let specimen = render_specimen(&face, 640).unwrap();
        assert_eq!(specimen.width(), 640);
        // the sample text leaves non-white ink on the canvas
        assert!(specimen.pixels().any(|p| p.0[0] < 250));
    }
}
