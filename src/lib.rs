// src/lib.rs

//! AppStream catalog generation from binary packages
//!
//! Turns a batch of RPM packages into AppStream catalog XML plus the derived
//! assets the catalog references: processed icons, font type specimens and
//! resized screenshots.
//!
//! # Architecture
//!
//! - Extraction: package payloads are unpacked into throwaway work areas,
//!   filtered to the UI-facing files the parsers understand
//! - Parsers: one per content type (desktop entries, fonts, input methods,
//!   GStreamer codecs), each producing a common application record
//! - Rules: an ordered acceptance pipeline merging AppData overrides and
//!   judging completeness; rejections are logged and skipped, never fatal
//! - Emission: per-package catalog XML and a flat icon archive, staged so
//!   output is always either complete or absent

pub mod aggregate;
pub mod build;
pub mod catalog;
pub mod config;
pub mod content;
mod error;
pub mod font;
pub mod image;
pub mod model;
pub mod package;
pub mod rules;
pub mod validate;

pub use aggregate::{Aggregator, DedupScope};
pub use build::{BuildSummary, Builder};
pub use config::Config;
pub use content::{ContentType, ParseOutcome, ParserContext};
pub use error::{Error, RejectReason, Result};
pub use model::{AppType, Application, Icon, Release, Screenshot};
pub use package::PackageInfo;
pub use rules::Verdict;
