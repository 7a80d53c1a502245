// src/model/application.rs

//! The unit of catalog output
//!
//! An [`Application`] is created by one content parser from one
//! package-relative file, enriched in place by the rule engine, owned by the
//! aggregation pass for one package until merged, then serialized and
//! discarded. There is no cross-run persistence beyond emitted files.

use crate::config::Config;
use crate::model::Screenshot;
use crate::package::PackageInfo;
use std::collections::BTreeMap;

/// The default locale key used for untranslated text
pub const DEFAULT_LOCALE: &str = "C";

/// Content type of a catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppType {
    Desktop,
    Font,
    InputMethod,
    Codec,
}

impl AppType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Font => "font",
            Self::InputMethod => "inputmethod",
            Self::Codec => "codec",
        }
    }
}

impl std::fmt::Display for AppType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an entry's icon is shipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Icon {
    /// A well-known theme icon name; no derived asset is needed
    Stock(String),
    /// A derived PNG shipped in the icon archive, named `<id>.png`
    Cached(String),
}

/// One upstream release, as carried in AppData
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: String,
    pub timestamp: u64,
}

/// A normalized catalog record
#[derive(Debug, Clone)]
pub struct Application {
    /// Short id, filename minus known extensions; used for icon names
    pub id: String,
    /// Full id as written to the catalog, e.g. retaining `.desktop`
    pub id_full: String,
    pub app_type: AppType,

    /// Locale -> display name; `"C"` is the required default
    pub names: BTreeMap<String, String>,
    /// Locale -> one-line summary
    pub summaries: BTreeMap<String, String>,
    /// Locale -> flattened long description
    pub descriptions: BTreeMap<String, String>,

    pub icon: Option<Icon>,
    /// Raw icon name from the source file; the rule engine resolves it into
    /// [`Icon`] (stock lookup or derived asset) during validation
    pub icon_name: Option<String>,
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub mimetypes: Vec<String>,

    /// Owning packages; codecs and merged fonts may span several
    pub package_names: Vec<String>,
    /// URL type -> URL; `"homepage"` is the common key
    pub urls: BTreeMap<String, String>,
    pub licence: Option<String>,
    pub project_group: Option<String>,
    pub compulsory_for_desktop: Vec<String>,

    pub screenshots: Vec<Screenshot>,
    /// Fonts opt out: their screenshots are already scaled text renders
    pub thumbnail_screenshots: bool,

    /// Vendor-extension key -> value
    pub metadata: BTreeMap<String, String>,
    /// Locale -> translation completeness percentage
    pub languages: BTreeMap<String, u32>,
    /// Most recent first; at most three are serialized
    pub releases: Vec<Release>,

    /// Set by parsers whose entries are unusable without an override file
    pub requires_appdata: bool,
}

impl Application {
    /// Create an empty record owned by `pkg`
    pub fn new(app_type: AppType, pkg: &PackageInfo) -> Self {
        let mut urls = BTreeMap::new();
        if let Some(url) = &pkg.homepage_url {
            urls.insert("homepage".to_string(), url.clone());
        }
        Self {
            id: String::new(),
            id_full: String::new(),
            app_type,
            names: BTreeMap::new(),
            summaries: BTreeMap::new(),
            descriptions: BTreeMap::new(),
            icon: None,
            icon_name: None,
            categories: Vec::new(),
            keywords: Vec::new(),
            mimetypes: Vec::new(),
            package_names: vec![pkg.name.clone()],
            urls,
            licence: pkg.licence.clone(),
            project_group: None,
            compulsory_for_desktop: Vec::new(),
            screenshots: Vec::new(),
            thumbnail_screenshots: true,
            metadata: BTreeMap::new(),
            languages: BTreeMap::new(),
            releases: Vec::new(),
            requires_appdata: false,
        }
    }

    /// Set the application id from a source filename
    ///
    /// The full id keeps any extension (and is what the catalog records); the
    /// short id drops the last extension and names derived assets. XML-hostile
    /// characters are replaced so ids are always safe to embed.
    pub fn set_id(&mut self, id_full: &str, cfg: &Config) {
        let sanitized: String = id_full
            .chars()
            .map(|c| match c {
                '&' | '<' | '>' => '-',
                other => other,
            })
            .collect();
        self.id_full = sanitized;
        self.id = match self.id_full.rsplit_once('.') {
            Some((stem, _ext)) => stem.to_string(),
            None => self.id_full.clone(),
        };

        for desktop in cfg.compulsory_for_desktop_for_id(&self.id) {
            if !self.compulsory_for_desktop.contains(desktop) {
                self.compulsory_for_desktop.push(desktop.clone());
            }
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.names.get(DEFAULT_LOCALE).map(String::as_str)
    }

    pub fn summary(&self) -> Option<&str> {
        self.summaries.get(DEFAULT_LOCALE).map(String::as_str)
    }

    pub fn homepage(&self) -> Option<&str> {
        self.urls.get("homepage").map(String::as_str)
    }

    /// Does this record satisfy the acceptance invariant?
    ///
    /// A catalog entry must carry a non-empty default-locale name and summary
    /// plus either a stock icon or a derived cached icon.
    pub fn is_complete(&self) -> bool {
        self.name().is_some_and(|s| !s.is_empty())
            && self.summary().is_some_and(|s| !s.is_empty())
            && self.icon.is_some()
    }

    pub fn add_package_name(&mut self, name: &str) {
        if !self.package_names.iter().any(|p| p == name) {
            self.package_names.push(name.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageInfo;

    fn pkg() -> PackageInfo {
        PackageInfo {
            name: "gnome-calculator".into(),
            version: "45.0".into(),
            licence: Some("GPLv3+".into()),
            homepage_url: Some("https://wiki.gnome.org/Apps/Calculator".into()),
            source_name: Some("gnome-calculator".into()),
        }
    }

    #[test]
    fn set_id_strips_known_extension() {
        let cfg = Config::default();
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("org.gnome.Calculator.desktop", &cfg);
        assert_eq!(app.id_full, "org.gnome.Calculator.desktop");
        assert_eq!(app.id, "org.gnome.Calculator");
    }

    #[test]
    fn set_id_sanitizes_markup_characters() {
        let cfg = Config::default();
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("weird<name>.desktop", &cfg);
        assert_eq!(app.id_full, "weird-name-.desktop");
    }

    #[test]
    fn set_id_applies_compulsory_overrides() {
        let cfg: Config = toml::from_str(
            r#"
            [compulsory_for_desktop]
            nautilus = ["GNOME"]
            "#,
        )
        .unwrap();
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("nautilus.desktop", &cfg);
        assert_eq!(app.compulsory_for_desktop, ["GNOME"]);
    }

    #[test]
    fn completeness_requires_name_summary_icon() {
        let cfg = Config::default();
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("calc.desktop", &cfg);
        assert!(!app.is_complete());
        app.names.insert("C".into(), "Calc".into());
        app.summaries.insert("C".into(), "A calculator".into());
        assert!(!app.is_complete());
        app.icon = Some(Icon::Stock("accessories-calculator".into()));
        assert!(app.is_complete());
    }

    #[test]
    fn package_names_merge_by_union() {
        let mut app = Application::new(AppType::Codec, &pkg());
        app.add_package_name("gnome-calculator");
        app.add_package_name("gnome-calculator-extras");
        assert_eq!(
            app.package_names,
            ["gnome-calculator", "gnome-calculator-extras"]
        );
    }
}
