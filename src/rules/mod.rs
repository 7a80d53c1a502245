// src/rules/mod.rs

//! The acceptance rule engine
//!
//! Every parsed application passes through [`evaluate`], an ordered sequence
//! of checks and enrichments. The order is part of the contract: blacklists
//! run before any expensive work, AppData overrides are merged before the
//! override-requirement gate, and the name/summary/icon requirement is judged
//! only after every source of those fields has had its say.

pub mod appdata;

use crate::config::glob_matches;
use crate::content::ParserContext;
use crate::error::{Error, RejectReason, Result};
use crate::image::{derive_icon, IconError};
use crate::model::{AppType, Application, Icon, Screenshot};
use crate::validate;
use appdata::AppData;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Outcome of rule evaluation for one application
#[derive(Debug)]
pub enum Verdict {
    Accept,
    Reject(RejectReason),
}

/// Run every acceptance rule against `app`, enriching it in place
///
/// Returns `Err` only for structural problems (override id mismatch,
/// disallowed licence, unreadable work area) that abort the whole package.
pub fn evaluate(
    app: &mut Application,
    ctx: &ParserContext,
    seen_ids: &HashSet<String>,
) -> Result<Verdict> {
    // cheap gates first
    if glob_matches(&ctx.cfg.blacklist.ids, &app.id) {
        return reject(RejectReason::BlacklistedId(app.id.clone()));
    }
    for category in &app.categories {
        if glob_matches(&ctx.cfg.blacklist.categories, category) {
            return reject(RejectReason::BlacklistedCategory(category.clone()));
        }
    }
    for pkgname in &app.package_names {
        if glob_matches(&ctx.cfg.blacklist.packages, pkgname) {
            return reject(RejectReason::BlacklistedPackage(pkgname.clone()));
        }
    }
    if seen_ids.contains(&app.id) {
        return reject(RejectReason::DuplicateId(app.id.clone()));
    }

    merge_appdata(app, ctx)?;

    if app.requires_appdata {
        return reject(RejectReason::RequiresAppData);
    }

    if app.project_group.is_none() {
        if let Some(url) = app.homepage() {
            if let Some(group) = ctx.cfg.project_group_for_homepage(url) {
                debug!(id = app.id.as_str(), group, "project group inferred from homepage");
                app.project_group = Some(group.to_string());
            }
        }
    }

    for extra in ctx.cfg.category_extra_for_id(&app.id) {
        if app.categories.contains(extra) {
            warn!(id = app.id.as_str(), category = extra.as_str(), "redundant category addition");
        } else {
            app.categories.push(extra.clone());
        }
    }

    if app.name().map(str::is_empty).unwrap_or(true) {
        return reject(RejectReason::MissingName);
    }
    if app.summary().map(str::is_empty).unwrap_or(true) {
        return reject(RejectReason::MissingSummary);
    }
    if app.icon.is_none() {
        match resolve_icon(app, ctx)? {
            Ok(icon) => app.icon = Some(icon),
            Err(reason) => return reject(reason),
        }
    }

    apply_screenshot_overrides(app, ctx)?;

    Ok(Verdict::Accept)
}

fn reject(reason: RejectReason) -> Result<Verdict> {
    Ok(Verdict::Reject(reason))
}

/// Locate and merge the AppData override for `app`, if one exists
///
/// An upstream file shipped inside the package shadows a distro-supplied
/// extra file of the same id. Merging clears the override requirement.
fn merge_appdata(app: &mut Application, ctx: &ParserContext) -> Result<()> {
    let upstream = ctx
        .tree_root
        .join("usr/share/appdata")
        .join(format!("{}.appdata.xml", app.id));
    let extra = ctx.cfg.appdata_extra_dir.as_ref().map(|dir| {
        Path::new(dir)
            .join(app.app_type.as_str())
            .join(format!("{}.appdata.xml", app.id))
    });

    let path = if upstream.is_file() {
        upstream
    } else {
        match extra {
            Some(path) if path.is_file() => path,
            _ => return Ok(()),
        }
    };

    // validation output is advisory; font specimens are generated, not
    // upstream-authored, so they skip it
    if app.app_type != AppType::Font {
        if let Some(report) = validate::validate_appdata(&ctx.cfg.validator, &path) {
            if !report.ok {
                warn!(id = app.id.as_str(), file = %path.display(), "AppData failed validation:\n{}", report.output);
            }
        }
    }

    let data = AppData::load(&path)?;

    if let Some(declared) = &data.id {
        if declared != &app.id {
            return Err(Error::IdMismatch {
                declared: declared.clone(),
                expected: app.id.clone(),
            });
        }
    }
    if let Some(licence) = &data.licence {
        if !ctx.cfg.content_licences.is_empty() && !ctx.cfg.licence_allowed(licence) {
            return Err(Error::DisallowedLicence {
                id: app.id.clone(),
                licence: licence.clone(),
            });
        }
    }

    // localized text is overridden wholesale: a curated override beats a mix
    if !data.names.is_empty() {
        app.names = data.names;
    }
    if !data.summaries.is_empty() {
        app.summaries = data.summaries;
    }
    if !data.descriptions.is_empty() {
        app.descriptions = data.descriptions;
    }
    for (url_type, url) in data.urls {
        app.urls.insert(url_type, url);
    }
    if let Some(group) = data.project_group {
        app.project_group = Some(group);
    }
    for (key, value) in data.metadata {
        // ExtraPackages is a merge directive, not catalog metadata
        if key == "ExtraPackages" {
            for pkgname in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                app.add_package_name(pkgname);
            }
            continue;
        }
        app.metadata.insert(key, value);
    }
    for desktop in data.compulsory_for_desktop {
        if !app.compulsory_for_desktop.contains(&desktop) {
            app.compulsory_for_desktop.push(desktop);
        }
    }

    if let Some(cache_dir) = &ctx.cfg.screenshots.cache_dir {
        for url in &data.screenshot_urls {
            let Some(basename) = url.rsplit('/').next().filter(|s| !s.is_empty()) else {
                continue;
            };
            let cached = Path::new(cache_dir).join(basename);
            if !cached.is_file() {
                debug!(id = app.id.as_str(), url, "screenshot not in cache, skipping");
                continue;
            }
            match image::open(&cached) {
                Ok(img) => app
                    .screenshots
                    .push(Screenshot::new(&app.id, img.to_rgba8(), None)),
                Err(e) => warn!(id = app.id.as_str(), file = %cached.display(), "unreadable cached screenshot: {e}"),
            }
        }
    }

    debug!(id = app.id.as_str(), file = %path.display(), "merged AppData");
    app.requires_appdata = false;
    Ok(())
}

/// Resolve the raw icon name into a stock reference or a derived asset
fn resolve_icon(
    app: &Application,
    ctx: &ParserContext,
) -> Result<std::result::Result<Icon, RejectReason>> {
    let Some(name) = app.icon_name.as_deref() else {
        return Ok(Err(RejectReason::MissingIcon("no icon specified".into())));
    };
    if ctx.cfg.is_stock_icon(name) {
        return Ok(Ok(Icon::Stock(name.to_string())));
    }

    let Some(source) = find_icon_file(ctx, name) else {
        return Ok(Err(RejectReason::MissingIcon(name.to_string())));
    };
    fs::create_dir_all(ctx.icons_dir)?;
    let target = ctx.icons_dir.join(format!("{}.png", app.id));

    let mut outcome = derive_icon(&source, &target, ctx.cfg.icons.size, ctx.cfg.icons.min_size);
    if matches!(outcome, Err(IconError::Decode(_)))
        && source.extension().and_then(|e| e.to_str()) == Some("png")
        && validate::repair_png(&ctx.cfg.validator, &source)
    {
        outcome = derive_icon(&source, &target, ctx.cfg.icons.size, ctx.cfg.icons.min_size);
    }
    match outcome {
        Ok(()) => Ok(Ok(Icon::Cached(app.id.clone()))),
        Err(IconError::TooSmall { width, height, min }) => {
            Ok(Err(RejectReason::IconTooSmall { width, height, min }))
        }
        Err(IconError::Decode(e)) | Err(IconError::Svg(e)) => {
            Ok(Err(RejectReason::CorruptIcon(e)))
        }
        Err(IconError::Unsupported(ext)) => Ok(Err(RejectReason::MissingIcon(format!(
            "unsupported icon format: {ext}"
        )))),
        Err(IconError::Io(e)) => Err(e.into()),
    }
}

/// Search the extracted tree for a named icon file
///
/// Absolute names are taken literally relative to the tree root. Bare names
/// are searched in the hicolor theme size directories in preference order,
/// then in the flat pixmap and icon directories, trying the well-known
/// extensions when the name carries none.
fn find_icon_file(ctx: &ParserContext, name: &str) -> Option<PathBuf> {
    if let Some(stripped) = name.strip_prefix('/') {
        let path = ctx.tree_root.join(stripped);
        return path.is_file().then_some(path);
    }

    let has_extension = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| matches!(e, "png" | "svg" | "xpm"));
    let extensions: &[&str] = if has_extension {
        &[""]
    } else {
        &[".png", ".svg", ".xpm"]
    };

    let mut dirs: Vec<PathBuf> = ctx
        .cfg
        .icons
        .preferred_sizes
        .iter()
        .map(|size| {
            ctx.tree_root
                .join("usr/share/icons/hicolor")
                .join(size)
                .join("apps")
        })
        .collect();
    dirs.push(ctx.tree_root.join("usr/share/pixmaps"));
    dirs.push(ctx.tree_root.join("usr/share/icons"));

    for dir in dirs {
        for ext in extensions {
            let candidate = dir.join(format!("{name}{ext}"));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Replace screenshots wholesale from the per-id override directory
fn apply_screenshot_overrides(app: &mut Application, ctx: &ParserContext) -> Result<()> {
    let Some(dir) = &ctx.cfg.screenshot_override_dir else {
        return Ok(());
    };
    let dir = Path::new(dir).join(&app.id);
    if !dir.is_dir() {
        return Ok(());
    }

    let mut files: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    files.sort();

    let mut shots = Vec::new();
    for path in files {
        match image::open(&path) {
            Ok(img) => shots.push(Screenshot::new(&app.id, img.to_rgba8(), None)),
            Err(e) => warn!(id = app.id.as_str(), file = %path.display(), "unreadable screenshot override: {e}"),
        }
    }
    if !shots.is_empty() {
        debug!(id = app.id.as_str(), count = shots.len(), "screenshots overridden");
        app.screenshots = shots;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::AppType;
    use crate::package::PackageInfo;
    use image::{Rgba, RgbaImage};

    fn pkg() -> PackageInfo {
        PackageInfo {
            name: "gnome-calculator".into(),
            version: "45.0".into(),
            licence: Some("GPLv3+".into()),
            homepage_url: None,
            source_name: None,
        }
    }

    fn complete_app(cfg: &Config) -> Application {
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("gnome-calculator.desktop", cfg);
        app.names.insert("C".into(), "Calculator".into());
        app.summaries.insert("C".into(), "Perform arithmetic".into());
        app.icon = Some(Icon::Stock("accessories-calculator".into()));
        app
    }

    struct Fixture {
        cfg: Config,
        pkg: PackageInfo,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new(cfg: Config) -> Self {
            Self {
                cfg,
                pkg: pkg(),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn ctx(&self) -> ParserContext<'_> {
            ParserContext {
                cfg: &self.cfg,
                pkg: &self.pkg,
                tree_root: self.dir.path(),
                icons_dir: self.dir.path(),
            }
        }
    }

    #[test]
    fn blacklisted_ids_are_rejected_first() {
        let cfg: Config = toml::from_str(
            r#"
            [blacklist]
            ids = ["gnome-*"]
            "#,
        )
        .unwrap();
        let fx = Fixture::new(cfg);
        let mut app = complete_app(&fx.cfg);
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::BlacklistedId(_))
        ));
    }

    #[test]
    fn blacklisted_categories_and_packages_are_rejected() {
        let cfg: Config = toml::from_str(
            r#"
            [blacklist]
            categories = ["DesktopSettings"]
            packages = ["*-tests"]
            "#,
        )
        .unwrap();
        let fx = Fixture::new(cfg);

        let mut app = complete_app(&fx.cfg);
        app.categories = vec!["DesktopSettings".into()];
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::BlacklistedCategory(_))
        ));

        let mut app = complete_app(&fx.cfg);
        app.package_names = vec!["gnome-tests".into()];
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::BlacklistedPackage(_))
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let fx = Fixture::new(Config::default());
        let mut app = complete_app(&fx.cfg);
        let mut seen = HashSet::new();
        seen.insert("gnome-calculator".to_string());
        let verdict = evaluate(&mut app, &fx.ctx(), &seen).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::DuplicateId(_))
        ));
    }

    #[test]
    fn missing_name_and_summary_reject() {
        let fx = Fixture::new(Config::default());
        let mut app = complete_app(&fx.cfg);
        app.names.clear();
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Reject(RejectReason::MissingName)));

        let mut app = complete_app(&fx.cfg);
        app.summaries.clear();
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::MissingSummary)
        ));
    }

    #[test]
    fn requires_appdata_without_override_rejects() {
        let fx = Fixture::new(Config::default());
        let mut app = complete_app(&fx.cfg);
        app.requires_appdata = true;
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::RequiresAppData)
        ));
    }

    #[test]
    fn upstream_appdata_clears_the_override_requirement() {
        let fx = Fixture::new(Config::default());
        let appdata_dir = fx.dir.path().join("usr/share/appdata");
        fs::create_dir_all(&appdata_dir).unwrap();
        fs::write(
            appdata_dir.join("gnome-calculator.appdata.xml"),
            "<application>\
             <id>gnome-calculator.desktop</id>\
             <name>Calculator Deluxe</name>\
             <summary>Even more arithmetic</summary>\
             <metadata><value key=\"ExtraPackages\">gcalc-data, gcalc-themes</value></metadata>\
             </application>",
        )
        .unwrap();

        let mut app = complete_app(&fx.cfg);
        app.requires_appdata = true;
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
        assert_eq!(app.names["C"], "Calculator Deluxe");
        assert_eq!(app.summaries["C"], "Even more arithmetic");
        assert_eq!(
            app.package_names,
            ["gnome-calculator", "gcalc-data", "gcalc-themes"]
        );
        // the directive is consumed, never serialized as a metadata value
        assert!(!app.metadata.contains_key("ExtraPackages"));
    }

    #[test]
    fn appdata_id_mismatch_is_fatal() {
        let fx = Fixture::new(Config::default());
        let appdata_dir = fx.dir.path().join("usr/share/appdata");
        fs::create_dir_all(&appdata_dir).unwrap();
        fs::write(
            appdata_dir.join("gnome-calculator.appdata.xml"),
            "<application><id>some-other-app</id></application>",
        )
        .unwrap();

        let mut app = complete_app(&fx.cfg);
        let err = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap_err();
        assert!(matches!(err, Error::IdMismatch { .. }));
    }

    #[test]
    fn disallowed_appdata_licence_is_fatal() {
        let cfg: Config = toml::from_str(r#"content_licences = ["CC0"]"#).unwrap();
        let fx = Fixture::new(cfg);
        let appdata_dir = fx.dir.path().join("usr/share/appdata");
        fs::create_dir_all(&appdata_dir).unwrap();
        fs::write(
            appdata_dir.join("gnome-calculator.appdata.xml"),
            "<application>\
             <id>gnome-calculator</id>\
             <licence>Proprietary</licence>\
             </application>",
        )
        .unwrap();

        let mut app = complete_app(&fx.cfg);
        let err = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap_err();
        assert!(matches!(err, Error::DisallowedLicence { .. }));
    }

    #[test]
    fn project_group_inferred_from_homepage_when_unset() {
        let cfg: Config = toml::from_str(
            r#"
            [project_group_patterns]
            "*gnome.org*" = "GNOME"
            "#,
        )
        .unwrap();
        let fx = Fixture::new(cfg);
        let mut app = complete_app(&fx.cfg);
        app.urls
            .insert("homepage".into(), "https://wiki.gnome.org/Calc".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
        assert_eq!(app.project_group.as_deref(), Some("GNOME"));

        // an explicit group is never overridden by inference
        let mut app = complete_app(&fx.cfg);
        app.urls
            .insert("homepage".into(), "https://wiki.gnome.org/Calc".into());
        app.project_group = Some("XFCE".into());
        evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert_eq!(app.project_group.as_deref(), Some("XFCE"));
    }

    #[test]
    fn configured_categories_are_appended_once() {
        let cfg: Config = toml::from_str(
            r#"
            [category_add]
            gnome-calculator = ["Science", "Utility"]
            "#,
        )
        .unwrap();
        let fx = Fixture::new(cfg);
        let mut app = complete_app(&fx.cfg);
        app.categories = vec!["Utility".into()];
        evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert_eq!(app.categories, ["Utility", "Science"]);
    }

    #[test]
    fn stock_icon_names_resolve_without_files() {
        let cfg: Config =
            toml::from_str(r#"stock_icons = ["accessories-calculator"]"#).unwrap();
        let fx = Fixture::new(cfg);
        let mut app = complete_app(&fx.cfg);
        app.icon = None;
        app.icon_name = Some("accessories-calculator".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
        assert_eq!(app.icon, Some(Icon::Stock("accessories-calculator".into())));
    }

    #[test]
    fn named_icons_are_derived_from_the_tree() {
        let fx = Fixture::new(Config::default());
        let icon_dir = fx
            .dir
            .path()
            .join("usr/share/icons/hicolor/64x64/apps");
        fs::create_dir_all(&icon_dir).unwrap();
        RgbaImage::from_pixel(64, 64, Rgba([10, 20, 30, 255]))
            .save(icon_dir.join("gnome-calculator.png"))
            .unwrap();

        let mut app = complete_app(&fx.cfg);
        app.icon = None;
        app.icon_name = Some("gnome-calculator".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
        assert_eq!(app.icon, Some(Icon::Cached("gnome-calculator".into())));
        assert!(fx.dir.path().join("gnome-calculator.png").is_file());
    }

    #[test]
    fn pixmap_icons_are_found_by_extension_probe() {
        let fx = Fixture::new(Config::default());
        let pixmaps = fx.dir.path().join("usr/share/pixmaps");
        fs::create_dir_all(&pixmaps).unwrap();
        RgbaImage::from_pixel(48, 48, Rgba([1, 2, 3, 255]))
            .save(pixmaps.join("gnome-calculator.png"))
            .unwrap();

        let mut app = complete_app(&fx.cfg);
        app.icon = None;
        app.icon_name = Some("gnome-calculator".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
    }

    #[test]
    fn undersized_icons_reject_the_application() {
        let fx = Fixture::new(Config::default());
        let pixmaps = fx.dir.path().join("usr/share/pixmaps");
        fs::create_dir_all(&pixmaps).unwrap();
        RgbaImage::from_pixel(16, 16, Rgba([1, 2, 3, 255]))
            .save(pixmaps.join("gnome-calculator.png"))
            .unwrap();

        let mut app = complete_app(&fx.cfg);
        app.icon = None;
        app.icon_name = Some("gnome-calculator".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::IconTooSmall { min: 32, .. })
        ));
    }

    #[test]
    fn unresolvable_icon_names_reject() {
        let fx = Fixture::new(Config::default());
        let mut app = complete_app(&fx.cfg);
        app.icon = None;
        app.icon_name = Some("no-such-icon".into());
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(
            verdict,
            Verdict::Reject(RejectReason::MissingIcon(_))
        ));
    }

    #[test]
    fn screenshot_overrides_replace_wholesale() {
        let override_root = tempfile::tempdir().unwrap();
        let shot_dir = override_root.path().join("gnome-calculator");
        fs::create_dir_all(&shot_dir).unwrap();
        RgbaImage::from_pixel(200, 100, Rgba([9, 9, 9, 255]))
            .save(shot_dir.join("b.png"))
            .unwrap();
        RgbaImage::from_pixel(100, 50, Rgba([8, 8, 8, 255]))
            .save(shot_dir.join("a.png"))
            .unwrap();

        let mut cfg = Config::default();
        cfg.screenshot_override_dir =
            Some(override_root.path().to_string_lossy().to_string());
        let fx = Fixture::new(cfg);

        let mut app = complete_app(&fx.cfg);
        app.screenshots
            .push(Screenshot::new("gnome-calculator", RgbaImage::from_pixel(10, 10, Rgba([0, 0, 0, 255])), None));
        let verdict = evaluate(&mut app, &fx.ctx(), &HashSet::new()).unwrap();
        assert!(matches!(verdict, Verdict::Accept));
        // replaced, sorted by filename
        assert_eq!(app.screenshots.len(), 2);
        assert_eq!(app.screenshots[0].width, 100);
        assert_eq!(app.screenshots[1].width, 200);
    }
}
