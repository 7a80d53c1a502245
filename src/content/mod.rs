// src/content/mod.rs

//! Content-type classification and parser dispatch
//!
//! The parser set is a closed enum: each package file is classified once by
//! path pattern, then handed to exactly one parser producing a common
//! [`Application`] record or a typed rejection. Codec libraries are the
//! exception: they aggregate per package, not per file (see
//! [`codec::parse_package`]).

pub mod codec;
pub mod desktop;
pub mod font;
pub mod inputmethod;

use crate::config::Config;
use crate::error::{RejectReason, Result};
use crate::model::Application;
use crate::package::PackageInfo;
use std::path::Path;

/// The closed set of recognized content types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Desktop,
    Font,
    InputMethod,
    Codec,
}

impl ContentType {
    /// Classify a package-relative path, `None` for uninteresting files
    pub fn classify(relative: &Path) -> Option<Self> {
        let path = relative.to_string_lossy();
        let path = path.trim_start_matches("./").trim_start_matches('/');
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        if path.starts_with("usr/share/applications/") && name.ends_with(".desktop") {
            return Some(Self::Desktop);
        }
        if path.starts_with("usr/share/fonts/")
            && (name.ends_with(".ttf") || name.ends_with(".otf"))
        {
            return Some(Self::Font);
        }
        if path.starts_with("usr/share/ibus/component/") && name.ends_with(".xml") {
            return Some(Self::InputMethod);
        }
        if path.starts_with("usr/share/ibus-table/tables/") && name.ends_with(".db") {
            return Some(Self::InputMethod);
        }
        if (path.starts_with("usr/lib64/gstreamer-1.0/")
            || path.starts_with("usr/lib/gstreamer-1.0/"))
            && name.starts_with("libgst")
            && name.ends_with(".so")
        {
            return Some(Self::Codec);
        }
        None
    }
}

/// Outcome of one parse: an application, or a reasoned rejection
#[derive(Debug)]
pub enum ParseOutcome {
    Accepted(Box<Application>),
    Rejected(RejectReason),
}

impl ParseOutcome {
    pub fn rejected(reason: RejectReason) -> Self {
        Self::Rejected(reason)
    }
}

/// Everything a parser needs besides the file itself
pub struct ParserContext<'a> {
    pub cfg: &'a Config,
    pub pkg: &'a PackageInfo,
    /// Root of the extracted package file tree
    pub tree_root: &'a Path,
    /// Directory derived icons are written into
    pub icons_dir: &'a Path,
}

/// Parse one classified file into an application record
///
/// Codec files are not parsed individually; collect them and call
/// [`codec::parse_package`] once per package.
pub fn parse(ctx: &ParserContext, content_type: ContentType, path: &Path) -> Result<ParseOutcome> {
    match content_type {
        ContentType::Desktop => desktop::parse(ctx, path),
        ContentType::Font => font::parse(ctx, path),
        ContentType::InputMethod => inputmethod::parse(ctx, path),
        ContentType::Codec => Ok(ParseOutcome::rejected(RejectReason::NoRecognizedCodecs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_path_pattern() {
        let cases = [
            ("usr/share/applications/gimp.desktop", Some(ContentType::Desktop)),
            (
                "./usr/share/applications/kde4/okular.desktop",
                Some(ContentType::Desktop),
            ),
            (
                "usr/share/fonts/dejavu/DejaVuSans.ttf",
                Some(ContentType::Font),
            ),
            (
                "usr/share/ibus/component/anthy.xml",
                Some(ContentType::InputMethod),
            ),
            (
                "usr/share/ibus-table/tables/wubi.db",
                Some(ContentType::InputMethod),
            ),
            (
                "usr/lib64/gstreamer-1.0/libgstmpg123.so",
                Some(ContentType::Codec),
            ),
            ("usr/lib64/gstreamer-1.0/libsomething.so", None),
            ("usr/share/doc/gimp/README", None),
            ("usr/share/applications/gimp.png", None),
        ];
        for (path, expected) in cases {
            assert_eq!(ContentType::classify(Path::new(path)), expected, "{path}");
        }
    }
}
