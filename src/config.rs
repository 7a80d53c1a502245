// src/config.rs

//! Build configuration
//!
//! One [`Config`] value is deserialized from a TOML file at startup and passed
//! by reference into every component. There is no process-wide configuration
//! state; components that need a rule table receive it explicitly.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

fn default_icon_size() -> u32 {
    64
}

fn default_min_icon_size() -> u32 {
    32
}

fn default_preferred_icon_sizes() -> Vec<String> {
    ["64x64", "128x128", "96x96", "256x256", "scalable", "48x48"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_thumbnail_sizes() -> Vec<(u32, u32)> {
    vec![(624, 351), (112, 63)]
}

fn default_specimen_width() -> u32 {
    640
}

fn default_validator_timeout() -> u64 {
    15
}

/// Icon derivation settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IconConfig {
    /// Edge length of generated square icons, in pixels
    #[serde(rename = "size")]
    pub size: u32,
    /// Sources below this native resolution are rejected rather than upscaled
    pub min_size: u32,
    /// hicolor theme size directories searched for a named icon, best first
    pub preferred_sizes: Vec<String>,
}

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            size: default_icon_size(),
            min_size: default_min_icon_size(),
            preferred_sizes: default_preferred_icon_sizes(),
        }
    }
}

/// Screenshot output settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    /// Base URL screenshots are mirrored to; empty disables screenshot output
    pub mirror_url: String,
    /// Thumbnail dimensions materialized per screenshot, as (width, height)
    pub thumbnail_sizes: Vec<(u32, u32)>,
    /// Target width of generated font specimens
    pub specimen_width: u32,
    /// Directory of pre-downloaded screenshot files referenced by AppData URLs
    pub cache_dir: Option<String>,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            mirror_url: String::new(),
            thumbnail_sizes: default_thumbnail_sizes(),
            specimen_width: default_specimen_width(),
            cache_dir: None,
        }
    }
}

/// Glob blacklists applied by the rule engine
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BlacklistConfig {
    pub ids: Vec<String>,
    pub categories: Vec<String>,
    pub packages: Vec<String>,
}

/// External AppData validator settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Validator executable; unset disables validation
    pub command: Option<String>,
    /// Extra arguments passed before the file path
    pub args: Vec<String>,
    /// Seconds before a validator run is judged failed
    pub timeout_secs: u64,
    /// Lossless PNG repair tool tried once on corrupt icons; unset disables
    pub png_repair_command: Option<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: default_validator_timeout(),
            png_repair_command: None,
        }
    }
}

/// The complete build configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Distribution name recorded in status output
    pub distro_name: String,

    pub icons: IconConfig,
    pub screenshots: ScreenshotConfig,
    pub blacklist: BlacklistConfig,
    pub validator: ValidatorConfig,

    /// Well-known theme icon names that need no derived asset
    pub stock_icons: Vec<String>,

    /// Licences acceptable for AppData-supplied content
    pub content_licences: Vec<String>,

    /// Categories silently dropped at serialization time
    pub ignore_categories: Vec<String>,

    /// Per-id category additions (id -> categories to append)
    pub category_add: BTreeMap<String, Vec<String>>,

    /// Per-id project group overrides (id -> group)
    pub project_group_for_id: BTreeMap<String, String>,

    /// Homepage URL glob -> inferred project group
    pub project_group_patterns: BTreeMap<String, String>,

    /// Per-id compulsory-for-desktop additions (id -> desktops)
    pub compulsory_for_desktop: BTreeMap<String, Vec<String>>,

    /// GStreamer element id -> human codec names
    pub codec_names: BTreeMap<String, Vec<String>>,

    /// Package glob -> companion package name whose files are co-extracted
    pub package_data: BTreeMap<String, String>,

    /// Directory of distro-supplied AppData files, laid out `<type>/<id>.appdata.xml`
    pub appdata_extra_dir: Option<String>,

    /// Directory of per-id screenshot override images, laid out `<id>/*.png`
    pub screenshot_override_dir: Option<String>,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn is_stock_icon(&self, name: &str) -> bool {
        self.stock_icons.iter().any(|s| s == name)
    }

    pub fn licence_allowed(&self, licence: &str) -> bool {
        self.content_licences.iter().any(|l| l == licence)
    }

    /// Additional categories configured for one application id
    pub fn category_extra_for_id(&self, id: &str) -> &[String] {
        self.category_add.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Explicit project group override for one application id
    pub fn project_group_for_id(&self, id: &str) -> Option<&str> {
        self.project_group_for_id.get(id).map(String::as_str)
    }

    /// Desktops an application id is compulsory for
    pub fn compulsory_for_desktop_for_id(&self, id: &str) -> &[String] {
        self.compulsory_for_desktop
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Infer a project group from a homepage URL, by configured glob patterns
    pub fn project_group_for_homepage(&self, url: &str) -> Option<&str> {
        for (pattern, group) in &self.project_group_patterns {
            if let Ok(p) = glob::Pattern::new(pattern) {
                if p.matches(url) {
                    return Some(group.as_str());
                }
            }
        }
        None
    }

    /// Companion packages to co-extract for a package name
    pub fn package_data_for(&self, pkgname: &str) -> Vec<&str> {
        let mut extra = Vec::new();
        for (pattern, data) in &self.package_data {
            if let Ok(p) = glob::Pattern::new(pattern) {
                if p.matches(pkgname) {
                    extra.push(data.as_str());
                }
            }
        }
        extra
    }

    pub fn validator_timeout(&self) -> Duration {
        Duration::from_secs(self.validator.timeout_secs)
    }
}

/// Does any glob in `patterns` match `value`?
pub fn glob_matches(patterns: &[String], value: &str) -> bool {
    patterns.iter().any(|b| {
        glob::Pattern::new(b)
            .map(|p| p.matches(value))
            .unwrap_or(false)
    })
}
