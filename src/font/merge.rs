// src/font/merge.rs

//! Per-family merging of font style variants
//!
//! Sibling font applications sharing one extracted family are folded into a
//! single catalog entry carrying all style-variant screenshots, ordered by
//! style rank. Superseded derived icons are removed from disk once merged.

use crate::font::{META_FAMILY, META_SUBFAMILY};
use crate::model::{AppType, Application};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// Style rank of a subfamily name: regular < italic < bold < bold-italic
///
/// Italic adds 1 and bold adds 2, so Regular=0, Italic=1, Bold=2,
/// BoldItalic=3.
pub fn style_rank(subfamily: &str) -> u32 {
    let s = subfamily.to_ascii_lowercase();
    let mut rank = 0;
    if s.contains("italic") || s.contains("oblique") {
        rank += 1;
    }
    if s.contains("bold") {
        rank += 2;
    }
    rank
}

fn rank_of(app: &Application) -> u32 {
    app.metadata
        .get(META_SUBFAMILY)
        .map(|s| style_rank(s))
        .unwrap_or(0)
}

/// Merge font applications sharing a family into one entry each
///
/// Non-font applications and fonts without an extracted family pass through
/// unchanged. Within a family the lowest-ranked variant becomes canonical
/// (its id names the merged entry); the other variants contribute their
/// screenshots in rank order and their derived icon files are deleted from
/// `icons_dir`.
pub fn merge_font_families(apps: Vec<Application>, icons_dir: &Path) -> Vec<Application> {
    let mut families: BTreeMap<String, Vec<Application>> = BTreeMap::new();
    let mut order: Vec<Result<Application, String>> = Vec::new();

    for app in apps {
        let family = if app.app_type == AppType::Font {
            app.metadata.get(META_FAMILY).cloned()
        } else {
            None
        };
        match family {
            Some(family) => {
                let group = families.entry(family.clone()).or_default();
                if group.is_empty() {
                    // placeholder keeps the family's first-seen position
                    order.push(Err(family));
                }
                group.push(app);
            }
            None => order.push(Ok(app)),
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for slot in order {
        match slot {
            Ok(app) => out.push(app),
            Err(family) => {
                let group = families.remove(&family).unwrap_or_default();
                out.push(merge_family(&family, group, icons_dir));
            }
        }
    }
    out
}

fn merge_family(family: &str, mut group: Vec<Application>, icons_dir: &Path) -> Application {
    group.sort_by(|a, b| rank_of(a).cmp(&rank_of(b)).then_with(|| a.id.cmp(&b.id)));
    let mut iter = group.into_iter();
    let mut canonical = iter
        .next()
        .expect("family groups are created non-empty");

    for variant in iter {
        info!(
            family = family,
            variant = variant.id.as_str(),
            into = canonical.id.as_str(),
            "merging font style variant"
        );
        canonical.screenshots.extend(variant.screenshots);
        for pkgname in &variant.package_names {
            canonical.add_package_name(pkgname);
        }

        // the variant's derived icon is superseded; do not leave it orphaned
        let icon_path = icons_dir.join(format!("{}.png", variant.id));
        if icon_path.exists() {
            if let Err(e) = fs::remove_file(&icon_path) {
                warn!(path = %icon_path.display(), "failed to remove superseded icon: {e}");
            }
        }
    }
    canonical
}
