// src/content/font.rs

//! Font file parser
//!
//! Builds a catalog entry from one TTF/OTF file: names from the naming
//! table, a glyph-pair icon and a type-specimen screenshot. A font whose
//! icon or specimen cannot be rendered is rejected, not published half-done.

use crate::content::{ParseOutcome, ParserContext};
use crate::error::{RejectReason, Result};
use crate::font::{
    extract_names, render_icon, render_specimen, select_sample_glyphs, META_FAMILY,
    META_FULL_NAME, META_SUBFAMILY,
};
use crate::model::{AppType, Application, Icon, Screenshot};
use std::fs;
use std::path::Path;
use tracing::debug;
use ttf_parser::Face;

/// Parse one font file
pub fn parse(ctx: &ParserContext, path: &Path) -> Result<ParseOutcome> {
    let data = fs::read(path)?;
    let face = match Face::parse(&data, 0) {
        Ok(face) => face,
        Err(e) => {
            return Ok(ParseOutcome::rejected(RejectReason::BadFont(e.to_string())));
        }
    };

    let mut app = Application::new(AppType::Font, ctx.pkg);
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    app.set_id(&basename, ctx.cfg);
    app.categories = vec!["Addons".to_string(), "Fonts".to_string()];
    // specimens are already scaled text renders; thumbnailing them again
    // would only blur the sample
    app.thumbnail_screenshots = false;

    let names = extract_names(&face);
    let family = names.family.clone().unwrap_or_else(|| app.id.clone());
    let full_name = names.full_name.clone().unwrap_or_else(|| family.clone());
    app.names.insert("C".to_string(), full_name.clone());
    app.summaries
        .insert("C".to_string(), format!("A font family from {family}"));
    app.metadata.insert(META_FAMILY.to_string(), family);
    if let Some(subfamily) = &names.subfamily {
        app.metadata
            .insert(META_SUBFAMILY.to_string(), subfamily.clone());
    }
    app.metadata
        .insert(META_FULL_NAME.to_string(), full_name.clone());

    let Some(sample) = select_sample_glyphs(&face) else {
        return Ok(ParseOutcome::rejected(RejectReason::NoSampleGlyphs));
    };
    debug!(id = app.id.as_str(), sample = sample, "rendering font sample");

    let Some(icon) = render_icon(&face, sample, ctx.cfg.icons.size) else {
        return Ok(ParseOutcome::rejected(RejectReason::EmptyRender));
    };
    fs::create_dir_all(ctx.icons_dir)?;
    icon.save(ctx.icons_dir.join(format!("{}.png", app.id)))?;
    app.icon = Some(Icon::Cached(app.id.clone()));

    let Some(specimen) = render_specimen(&face, ctx.cfg.screenshots.specimen_width) else {
        return Ok(ParseOutcome::rejected(RejectReason::EmptyRender));
    };
    app.screenshots
        .push(Screenshot::new(&app.id, specimen, Some(full_name)));

    Ok(ParseOutcome::Accepted(Box::new(app)))
}
