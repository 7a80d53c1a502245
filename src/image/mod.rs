// src/image/mod.rs

//! Image asset pipeline
//!
//! Decodes icons and screenshots from raster (PNG/GIF), indexed (XPM/ICO) and
//! vector (SVG) sources and produces fixed-size PNG outputs with
//! deterministic naming.

pub mod pipeline;
pub mod xpm;

pub use pipeline::{autocrop, center_on_canvas, derive_icon, pixmap_to_image, IconError};
