// src/content/inputmethod.rs

//! Input method parsers
//!
//! Two source shapes exist: ibus component XML descriptors and ibus-table
//! engine databases. Component files in the wild are sometimes headerless or
//! prefixed with garbage, so parsing starts at the first recognized root tag.
//! Neither shape carries artwork or a proper summary, so both flag the entry
//! as requiring an external metadata override.

use crate::content::{ParseOutcome, ParserContext};
use crate::error::{RejectReason, Result};
use crate::model::{AppType, Application, Icon};
use quick_xml::events::Event;
use quick_xml::Reader;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Parse one input method descriptor (component XML or table database)
pub fn parse(ctx: &ParserContext, path: &Path) -> Result<ParseOutcome> {
    let is_table = path.extension().and_then(|e| e.to_str()) == Some("db");
    if is_table {
        parse_table(ctx, path)
    } else {
        parse_component(ctx, path)
    }
}

fn new_app(ctx: &ParserContext, path: &Path) -> Application {
    let mut app = Application::new(AppType::InputMethod, ctx.pkg);
    let basename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    app.set_id(&basename, ctx.cfg);
    app.categories = vec!["Addons".to_string(), "InputSources".to_string()];
    app.icon = Some(Icon::Stock("system-run".to_string()));
    app.requires_appdata = true;
    app
}

/// Text collected from an ibus component descriptor
#[derive(Default)]
struct ComponentText {
    description: Option<String>,
    homepage: Option<String>,
    engine_longname: Option<String>,
    engine_description: Option<String>,
}

fn parse_component(ctx: &ParserContext, path: &Path) -> Result<ParseOutcome> {
    let raw = fs::read(path)?;
    let text = String::from_utf8_lossy(&raw);

    // tolerate headerless files and leading garbage
    let Some(start) = text.find("<component") else {
        return Ok(ParseOutcome::rejected(RejectReason::EmptyComponent));
    };
    let component = extract_component_text(&text[start..])?;

    let mut app = new_app(ctx, path);
    // a nested engine block knows the human name better than the component
    let name = component
        .engine_longname
        .clone()
        .or_else(|| component.description.clone());
    let summary = component
        .engine_description
        .clone()
        .or_else(|| component.description.clone());
    let Some(name) = name else {
        return Ok(ParseOutcome::rejected(RejectReason::EmptyComponent));
    };
    app.names.insert("C".to_string(), name);
    if let Some(summary) = summary {
        app.summaries.insert("C".to_string(), summary);
    }
    if let Some(homepage) = component.homepage {
        app.urls.insert("homepage".to_string(), homepage);
    }
    Ok(ParseOutcome::Accepted(Box::new(app)))
}

fn extract_component_text(xml: &str) -> Result<ComponentText> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut out = ComponentText::default();
    let mut stack: Vec<String> = Vec::new();
    let mut in_first_engine = false;
    let mut engines_seen = 0u32;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                if tag == "engine" && stack.ends_with(&["component".into(), "engines".into()]) {
                    engines_seen += 1;
                    in_first_engine = engines_seen == 1;
                }
                stack.push(tag);
            }
            Ok(Event::End(_)) => {
                if stack.pop().as_deref() == Some("engine") {
                    in_first_engine = false;
                }
                if stack.is_empty() {
                    break;
                }
            }
            Ok(Event::Text(ref t)) => {
                let value = t.unescape().unwrap_or_default().trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match stack.last().map(String::as_str) {
                    Some("description") if stack.len() == 2 && out.description.is_none() => {
                        out.description = Some(value);
                    }
                    Some("homepage") if stack.len() == 2 && out.homepage.is_none() => {
                        out.homepage = Some(value);
                    }
                    Some("longname") if in_first_engine && out.engine_longname.is_none() => {
                        out.engine_longname = Some(value);
                    }
                    Some("description") if in_first_engine && out.engine_description.is_none() => {
                        out.engine_description = Some(value);
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            // tolerate trailing garbage after the component closes
            Err(_) if stack.is_empty() => break,
            Err(e) => return Err(e.into()),
            Ok(_) => {}
        }
    }
    Ok(out)
}

fn parse_table(ctx: &ParserContext, path: &Path) -> Result<ParseOutcome> {
    let conn = Connection::open_with_flags(
        path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    let mut stmt = conn.prepare("SELECT attr, val FROM ime")?;
    let mut rows = stmt.query([])?;

    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    while let Some(row) = rows.next()? {
        let attr: String = row.get(0)?;
        let val: String = row.get(1)?;
        match attr.as_str() {
            "name" if name.is_none() => name = Some(val),
            "description" if description.is_none() => description = Some(val),
            _ => {}
        }
    }

    let Some(name) = name else {
        return Ok(ParseOutcome::rejected(RejectReason::EmptyComponent));
    };
    let mut app = new_app(ctx, path);
    app.summaries
        .insert("C".to_string(), description.unwrap_or_else(|| name.clone()));
    app.names.insert("C".to_string(), name);
    Ok(ParseOutcome::Accepted(Box::new(app)))
}
