// src/error.rs

//! Error taxonomy for the metadata pipeline
//!
//! Two distinct kinds of outcome flow through the pipeline:
//!
//! - [`Error`]: fatal, structural problems (unreadable archive, id mismatch
//!   between a parser and its override file, disallowed licence). These abort
//!   processing of the current package and propagate to the caller.
//! - [`RejectReason`]: expected, non-exceptional outcomes (blacklisted id,
//!   missing summary, icon too small). These drop a single application and
//!   processing continues with the next file.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal pipeline errors that abort the current package
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read package {path}: {reason}")]
    BadPackage { path: PathBuf, reason: String },

    #[error("Failed to decompress payload: {0}")]
    Decompression(String),

    #[error("Malformed cpio payload: {0}")]
    Cpio(String),

    #[error("Failed to load configuration {path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Metadata override id '{declared}' does not match application '{expected}'")]
    IdMismatch { declared: String, expected: String },

    #[error("Licence '{licence}' is not in the allowed content licence set for {id}")]
    DisallowedLicence { id: String, licence: String },

    #[error("ibus-table database error: {0}")]
    Table(#[from] rusqlite::Error),

    #[error("{0}")]
    Other(String),
}

/// Convenience result type used across the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Why an application was dropped from the catalog
///
/// Rejections are logged and skipped, never propagated as errors. The display
/// form is the human-readable half of the greppable per-item log line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    #[error("id is blacklisted: {0}")]
    BlacklistedId(String),

    #[error("category is blacklisted: {0}")]
    BlacklistedCategory(String),

    #[error("package is blacklisted: {0}")]
    BlacklistedPackage(String),

    #[error("duplicate ID in package: {0}")]
    DuplicateId(String),

    #[error("not an application")]
    NotAnApplication,

    #[error("requires AppData as NoDisplay=true")]
    RequiresAppData,

    #[error("no default-locale name")]
    MissingName,

    #[error("no default-locale summary")]
    MissingSummary,

    #[error("no usable icon: {0}")]
    MissingIcon(String),

    #[error("icon too small to process ({width}x{height}, minimum {min})")]
    IconTooSmall { width: u32, height: u32, min: u32 },

    #[error("icon is corrupt: {0}")]
    CorruptIcon(String),

    #[error("font has no usable sample glyphs")]
    NoSampleGlyphs,

    #[error("font could not be parsed: {0}")]
    BadFont(String),

    #[error("font rendering produced no visible pixels")]
    EmptyRender,

    #[error("no recognized codecs in package")]
    NoRecognizedCodecs,

    #[error("component descriptor has no usable description")]
    EmptyComponent,
}
