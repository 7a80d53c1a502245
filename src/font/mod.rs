// src/font/mod.rs

//! Font introspection and rendering
//!
//! Extracts naming metadata from font tables, picks representative sample
//! glyphs matching the font's actual script coverage, renders icon and type
//! specimen images, and merges weight/style variants of one family into a
//! single catalog entry.

pub mod introspect;
pub mod merge;
pub mod render;

pub use introspect::{extract_names, select_sample_glyphs, FontNames};
pub use merge::{merge_font_families, style_rank};
pub use render::{render_icon, render_specimen, SPECIMEN_TEXT};

/// Metadata key carrying the extracted family name
pub const META_FAMILY: &str = "FontFamily";
/// Metadata key carrying the extracted subfamily (style) name
pub const META_SUBFAMILY: &str = "FontSubFamily";
/// Metadata key carrying the extracted full name
pub const META_FULL_NAME: &str = "FontFullName";
