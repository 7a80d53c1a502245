// src/content/codec.rs

//! GStreamer codec parser
//!
//! Codec plugins are aggregated per package: every `libgst*.so` in the
//! package contributes its recognized codec names, and the package as a
//! whole becomes one catalog entry. Plugins not listed in the codec name
//! table are ignored rather than guessed at.

use crate::content::{ParseOutcome, ParserContext};
use crate::error::{RejectReason, Result};
use crate::model::{AppType, Application, Icon};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Build one codec entry from all plugin libraries of a package
pub fn parse_package(ctx: &ParserContext, plugin_paths: &[PathBuf]) -> Result<ParseOutcome> {
    let mut names: BTreeSet<&str> = BTreeSet::new();
    for path in plugin_paths {
        let Some(element) = element_id(path) else {
            continue;
        };
        match ctx.cfg.codec_names.get(element) {
            Some(codec_names) => {
                names.extend(codec_names.iter().map(String::as_str));
            }
            None => debug!(element, "no codec names known for plugin"),
        }
    }
    if names.is_empty() {
        return Ok(ParseOutcome::rejected(RejectReason::NoRecognizedCodecs));
    }

    let mut app = Application::new(AppType::Codec, ctx.pkg);
    app.set_id(&codec_id(&ctx.pkg.name), ctx.cfg);
    app.names
        .insert("C".to_string(), "GStreamer Multimedia Codecs".to_string());
    app.categories = vec!["Addons".to_string(), "Codecs".to_string()];
    app.icon = Some(Icon::Stock("application-x-executable".to_string()));
    app.requires_appdata = true;
    app.keywords = names.iter().map(|n| n.to_string()).collect();

    // encoders are real capabilities but make a poor playback pitch
    let playable: Vec<&str> = names
        .iter()
        .copied()
        .filter(|n| !n.to_ascii_lowercase().contains("encoder"))
        .collect();
    if !playable.is_empty() {
        app.summaries
            .insert("C".to_string(), playback_summary(&playable));
    }

    Ok(ParseOutcome::Accepted(Box::new(app)))
}

/// `libgstmpg123.so` -> `mpg123`
fn element_id(path: &Path) -> Option<&str> {
    path.file_name()?
        .to_str()?
        .strip_prefix("libgst")?
        .strip_suffix(".so")
}

/// Derive a stable id from the owning package name
///
/// `gstreamer1-plugins-good` and `gstreamer-plugins-good` both become
/// `gstreamer-good`, so the same plugin set dedupes across streams.
fn codec_id(pkgname: &str) -> String {
    let stripped = pkgname
        .trim_start_matches("gstreamer1-")
        .trim_start_matches("gstreamer-")
        .trim_start_matches("plugins-");
    format!("gstreamer-{stripped}")
}

/// "A", "A and B", "A, B and C"
fn playback_summary(names: &[&str]) -> String {
    let joined = match names {
        [only] => (*only).to_string(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
        [] => String::new(),
    };
    format!("Multimedia playback for {joined}")
}
