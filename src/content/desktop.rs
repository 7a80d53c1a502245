// src/content/desktop.rs

//! Desktop entry parser
//!
//! Reads the `[Desktop Entry]` group of a key-file, honoring bracketed locale
//! suffixes (`Name[de]=...`). Scanning stops as soon as the file turns out
//! not to describe an application. `NoDisplay=true` entries are accepted but
//! flagged as requiring an external metadata override.

use crate::content::{ParseOutcome, ParserContext};
use crate::error::{RejectReason, Result};
use crate::model::{AppType, Application};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Parse one `.desktop` file
pub fn parse(ctx: &ParserContext, path: &Path) -> Result<ParseOutcome> {
    let text = fs::read_to_string(path)?;

    let mut app = Application::new(AppType::Desktop, ctx.pkg);
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    app.set_id(&basename, ctx.cfg);

    let mut is_application = false;
    let mut no_display = false;

    for (key, locale, value) in entry_lines(&text) {
        match key {
            "Type" => {
                if value != "Application" {
                    // not worth scanning the rest of the file
                    return Ok(ParseOutcome::rejected(RejectReason::NotAnApplication));
                }
                is_application = true;
            }
            "NoDisplay" => {
                if value.eq_ignore_ascii_case("true") {
                    no_display = true;
                }
            }
            "Name" => {
                app.names
                    .insert(locale.unwrap_or("C").to_string(), value.to_string());
            }
            "Comment" => {
                app.summaries
                    .insert(locale.unwrap_or("C").to_string(), value.to_string());
            }
            "Icon" => {
                let icon = value.trim();
                if !icon.is_empty() {
                    app.icon_name = Some(icon.to_string());
                }
            }
            "Categories" => app.categories = split_list(value),
            "Keywords" => {
                if locale.is_none() {
                    app.keywords = split_list(value);
                }
            }
            "MimeType" => app.mimetypes = split_list(value),
            "X-GNOME-Bugzilla-Product" => app.project_group = Some("GNOME".to_string()),
            "X-MATE-Bugzilla-Product" => app.project_group = Some("MATE".to_string()),
            "Exec" => {
                if value.starts_with("xfce4-") {
                    app.project_group = Some("XFCE".to_string());
                }
            }
            "OnlyShowIn" => {
                // a single entry ties the app to that desktop
                let desktops = split_list(value);
                if desktops.len() == 1 {
                    app.project_group = Some(desktops[0].clone());
                }
            }
            k if k.starts_with("X-KDE-") => app.project_group = Some("KDE".to_string()),
            _ => {}
        }
    }

    if !is_application {
        return Ok(ParseOutcome::rejected(RejectReason::NotAnApplication));
    }

    if no_display {
        debug!(id = app.id_full.as_str(), "requires AppData as NoDisplay=true");
        app.requires_appdata = true;
    }

    // explicit per-id configuration beats anything inferred from the file
    if let Some(group) = ctx.cfg.project_group_for_id(&app.id) {
        app.project_group = Some(group.to_string());
    }

    Ok(ParseOutcome::Accepted(Box::new(app)))
}

/// Iterate `key[locale]=value` lines of the `[Desktop Entry]` group
fn entry_lines(text: &str) -> impl Iterator<Item = (&str, Option<&str>, &str)> {
    let mut in_entry_group = false;
    text.lines().filter_map(move |line| {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        if let Some(group) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_entry_group = group == "Desktop Entry";
            return None;
        }
        if !in_entry_group {
            return None;
        }
        let (raw_key, value) = line.split_once('=')?;
        let raw_key = raw_key.trim();
        let value = value.trim();
        match raw_key.split_once('[') {
            Some((key, rest)) => {
                let locale = rest.strip_suffix(']')?;
                Some((key, Some(locale), value))
            }
            None => Some((raw_key, None, value)),
        }
    })
}

/// Split a `;`-separated desktop list value
fn split_list(value: &str) -> Vec<String> {
    value
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
