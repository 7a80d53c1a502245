// src/rules/appdata.rs

//! AppData override file parser
//!
//! AppData is upstream-supplied XML that overrides and enriches a parsed
//! application. Rich-text descriptions are flattened here into plain text per
//! locale: paragraphs become blocks, unordered list items get a bullet prefix
//! and ordered items a running number, since the catalog description field is
//! plain text.

use crate::error::Result;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Parsed content of one AppData file
#[derive(Debug, Default)]
pub struct AppData {
    pub id: Option<String>,
    pub licence: Option<String>,
    pub names: BTreeMap<String, String>,
    pub summaries: BTreeMap<String, String>,
    pub descriptions: BTreeMap<String, String>,
    /// URL type -> URL
    pub urls: BTreeMap<String, String>,
    pub project_group: Option<String>,
    /// Vendor-extension values, keyed by the `key` attribute
    pub metadata: BTreeMap<String, String>,
    /// Screenshot source URLs, in document order
    pub screenshot_urls: Vec<String>,
    pub compulsory_for_desktop: Vec<String>,
}

impl AppData {
    /// Parse an AppData file from disk
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text)
    }

    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut out = Self::default();
        let mut stack: Vec<String> = Vec::new();
        let mut locale: Option<String> = None;
        let mut url_type: Option<String> = None;
        let mut metadata_key: Option<String> = None;
        let mut description = DescriptionFlattener::default();

        loop {
            match reader.read_event()? {
                Event::Start(ref e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();
                    locale = None;
                    for attr in e.attributes().flatten() {
                        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
                        let value = attr.unescape_value().unwrap_or_default().to_string();
                        match key.as_str() {
                            "xml:lang" => locale = Some(value),
                            "type" if tag == "url" => url_type = Some(value),
                            "key" if tag == "value" => metadata_key = Some(value),
                            _ => {}
                        }
                    }
                    if in_description(&stack) {
                        description.open(&tag, locale.clone());
                    }
                    stack.push(tag);
                }
                Event::End(_) => {
                    if let Some(tag) = stack.pop() {
                        if in_description(&stack) {
                            description.close(&tag);
                        }
                        if tag == "url" {
                            url_type = None;
                        }
                    }
                }
                Event::Text(ref t) => {
                    let value = t.unescape().unwrap_or_default().trim().to_string();
                    if value.is_empty() {
                        continue;
                    }
                    if in_description(&stack) {
                        description.text(&value);
                        continue;
                    }
                    let key = locale.clone().unwrap_or_else(|| "C".to_string());
                    let at_root = stack.len() == 2;
                    match stack.last().map(String::as_str) {
                        Some("id") if at_root => out.id = Some(strip_id_extension(&value)),
                        Some("licence") | Some("metadata_license") | Some("license")
                            if at_root =>
                        {
                            out.licence = Some(value);
                        }
                        Some("name") if at_root => {
                            out.names.entry(key).or_insert(value);
                        }
                        Some("summary") if at_root => {
                            out.summaries.entry(key).or_insert(value);
                        }
                        Some("url") if at_root => {
                            let url_type = url_type.clone().unwrap_or_else(|| "homepage".into());
                            out.urls.insert(url_type, value);
                        }
                        Some("project_group") if at_root => out.project_group = Some(value),
                        Some("compulsory_for_desktop") if at_root => {
                            if !out.compulsory_for_desktop.contains(&value) {
                                out.compulsory_for_desktop.push(value);
                            }
                        }
                        Some("value") if stack.get(1).map(String::as_str) == Some("metadata") => {
                            if let Some(key) = metadata_key.take() {
                                out.metadata.insert(key, value);
                            }
                        }
                        Some("screenshot")
                            if stack.get(1).map(String::as_str) == Some("screenshots") =>
                        {
                            out.screenshot_urls.push(value);
                        }
                        _ => {}
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        out.descriptions = description.finish();
        Ok(out)
    }
}

/// Is the cursor inside a `<description>` element of the root component?
fn in_description(stack: &[String]) -> bool {
    stack.len() >= 2 && stack[1] == "description"
}

/// AppData ids sometimes carry a trailing `.desktop`; the match against the
/// owning application uses the short form.
fn strip_id_extension(id: &str) -> String {
    id.trim_end_matches(".desktop").to_string()
}

/// Flattens `<p>`/`<ul>`/`<ol>` rich text into plain blocks per locale
#[derive(Default)]
struct DescriptionFlattener {
    blocks: BTreeMap<String, Vec<String>>,
    current_locale: String,
    list_counter: Option<u32>,
    pending: Option<String>,
}

impl DescriptionFlattener {
    fn open(&mut self, tag: &str, locale: Option<String>) {
        match tag {
            "p" => {
                self.current_locale = locale.unwrap_or_else(|| "C".to_string());
                self.pending = Some(String::new());
            }
            "ul" => self.list_counter = None,
            "ol" => self.list_counter = Some(0),
            "li" => {
                self.current_locale = locale.unwrap_or_else(|| "C".to_string());
                let prefix = match &mut self.list_counter {
                    Some(n) => {
                        *n += 1;
                        format!(" {}. ", n)
                    }
                    None => "• ".to_string(),
                };
                self.pending = Some(prefix);
            }
            _ => {}
        }
    }

    fn text(&mut self, value: &str) {
        if let Some(pending) = &mut self.pending {
            if !pending.is_empty() && !pending.ends_with(' ') {
                pending.push(' ');
            }
            pending.push_str(value);
        }
    }

    fn close(&mut self, tag: &str) {
        if tag == "p" || tag == "li" {
            if let Some(block) = self.pending.take() {
                if !block.trim().is_empty() {
                    self.blocks
                        .entry(self.current_locale.clone())
                        .or_default()
                        .push(block);
                }
            }
        }
    }

    fn finish(self) -> BTreeMap<String, String> {
        self.blocks
            .into_iter()
            .map(|(locale, blocks)| (locale, blocks.join("\n")))
            .collect()
    }
}
