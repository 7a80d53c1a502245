// src/catalog.rs

//! Catalog XML serialization and asset emission
//!
//! Writes the `applications` document, materializes screenshot files next to
//! it, and packs derived icons into a flat tar. One broken application never
//! takes the catalog down: its serialization error is logged and the entry is
//! skipped.
//!
//! Category fixups happen here, at the last possible moment, so every earlier
//! stage sees the categories as the source declared them.

use crate::config::Config;
use crate::error::Result;
use crate::model::{Application, Icon};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tracing::{error, warn};

/// Escape text for XML element content and attribute values
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Write the catalog document for `apps` to `xml_path`
///
/// Screenshot files are materialized under `screenshots_dir` (`source/` plus
/// one directory per thumbnail size) when a mirror URL is configured.
pub fn write_catalog(
    apps: &[Application],
    cfg: &Config,
    xml_path: &Path,
    screenshots_dir: &Path,
) -> Result<()> {
    let mut doc = String::new();
    doc.push_str("<?xml version=\"1.0\"?>\n");
    doc.push_str("<applications version=\"0.1\">\n");
    for app in apps {
        match application_xml(app, cfg, screenshots_dir) {
            Ok(fragment) => doc.push_str(&fragment),
            Err(e) => error!(id = app.id.as_str(), "failed to serialize application: {e}"),
        }
    }
    doc.push_str("</applications>\n");

    if let Some(parent) = xml_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = File::create(xml_path)?;
    file.write_all(doc.as_bytes())?;
    Ok(())
}

/// Pack every derived PNG under `icons_dir` into a flat tar at `tar_path`
pub fn write_icon_archive(tar_path: &Path, icons_dir: &Path) -> Result<()> {
    let file = File::create(tar_path)?;
    let mut builder = tar::Builder::new(file);

    let mut icons: Vec<_> = fs::read_dir(icons_dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("png"))
        .collect();
    icons.sort();

    for path in icons {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        builder.append_path_with_name(&path, &name)?;
    }
    builder.finish()?;
    Ok(())
}

fn application_xml(app: &Application, cfg: &Config, screenshots_dir: &Path) -> Result<String> {
    let mut x = String::new();
    x.push_str("  <application>\n");
    x.push_str(&format!(
        "    <id type=\"{}\">{}</id>\n",
        app.app_type,
        xml_escape(&app.id_full)
    ));
    for pkgname in &app.package_names {
        x.push_str(&format!("    <pkgname>{}</pkgname>\n", xml_escape(pkgname)));
    }

    write_localized(&mut x, "name", &app.names);
    write_localized(&mut x, "summary", &app.summaries);

    match &app.icon {
        Some(Icon::Stock(name)) => {
            x.push_str(&format!(
                "    <icon type=\"stock\">{}</icon>\n",
                xml_escape(name)
            ));
        }
        Some(Icon::Cached(id)) => {
            x.push_str(&format!(
                "    <icon type=\"cached\">{}.png</icon>\n",
                xml_escape(id)
            ));
        }
        None => {}
    }

    let categories = fixup_categories(&app.id, &app.categories, cfg);
    if !categories.is_empty() {
        x.push_str("    <appcategories>\n");
        for category in &categories {
            x.push_str(&format!(
                "      <appcategory>{}</appcategory>\n",
                xml_escape(category)
            ));
        }
        x.push_str("    </appcategories>\n");
    }

    if !app.keywords.is_empty() {
        x.push_str("    <keywords>\n");
        for keyword in &app.keywords {
            x.push_str(&format!(
                "      <keyword>{}</keyword>\n",
                xml_escape(keyword)
            ));
        }
        x.push_str("    </keywords>\n");
    }
    if !app.mimetypes.is_empty() {
        x.push_str("    <mimetypes>\n");
        for mimetype in &app.mimetypes {
            x.push_str(&format!(
                "      <mimetype>{}</mimetype>\n",
                xml_escape(mimetype)
            ));
        }
        x.push_str("    </mimetypes>\n");
    }

    for (url_type, url) in &app.urls {
        x.push_str(&format!(
            "    <url type=\"{}\">{}</url>\n",
            xml_escape(url_type),
            xml_escape(url)
        ));
    }
    if let Some(group) = &app.project_group {
        x.push_str(&format!(
            "    <project_group>{}</project_group>\n",
            xml_escape(group)
        ));
    }
    for desktop in &app.compulsory_for_desktop {
        x.push_str(&format!(
            "    <compulsory_for_desktop>{}</compulsory_for_desktop>\n",
            xml_escape(desktop)
        ));
    }

    write_localized(&mut x, "description", &app.descriptions);

    if !app.screenshots.is_empty() && !cfg.screenshots.mirror_url.is_empty() {
        let mirror = cfg.screenshots.mirror_url.trim_end_matches('/');
        x.push_str("    <screenshots>\n");
        for (i, shot) in app.screenshots.iter().enumerate() {
            shot.write_source(&screenshots_dir.join("source"))?;
            let kind = if i == 0 { "default" } else { "normal" };
            x.push_str(&format!("      <screenshot type=\"{kind}\">\n"));
            if let Some(caption) = &shot.caption {
                x.push_str(&format!(
                    "        <caption>{}</caption>\n",
                    xml_escape(caption)
                ));
            }
            x.push_str(&format!(
                "        <image type=\"source\" width=\"{}\" height=\"{}\">{mirror}/source/{}</image>\n",
                shot.width,
                shot.height,
                xml_escape(&shot.basename)
            ));
            if app.thumbnail_screenshots {
                for &(w, h) in &cfg.screenshots.thumbnail_sizes {
                    shot.write_thumbnail(&screenshots_dir.join(format!("{w}x{h}")), (w, h))?;
                    x.push_str(&format!(
                        "        <image type=\"thumbnail\" width=\"{w}\" height=\"{h}\">{mirror}/{w}x{h}/{}</image>\n",
                        xml_escape(&shot.basename)
                    ));
                }
            }
            x.push_str("      </screenshot>\n");
        }
        x.push_str("    </screenshots>\n");
    }

    if !app.languages.is_empty() {
        x.push_str("    <languages>\n");
        for (locale, percentage) in &app.languages {
            x.push_str(&format!(
                "      <lang percentage=\"{percentage}\">{}</lang>\n",
                xml_escape(locale)
            ));
        }
        x.push_str("    </languages>\n");
    }

    if !app.releases.is_empty() {
        x.push_str("    <releases>\n");
        for release in app.releases.iter().take(3) {
            x.push_str(&format!(
                "      <release version=\"{}\" timestamp=\"{}\"/>\n",
                xml_escape(&release.version),
                release.timestamp
            ));
        }
        x.push_str("    </releases>\n");
    }

    if !app.metadata.is_empty() {
        x.push_str("    <metadata>\n");
        for (key, value) in &app.metadata {
            x.push_str(&format!(
                "      <value key=\"{}\">{}</value>\n",
                xml_escape(key),
                xml_escape(value)
            ));
        }
        x.push_str("    </metadata>\n");
    }

    x.push_str("  </application>\n");
    Ok(x)
}

/// Write one localized element set, default locale first and bare
fn write_localized(
    x: &mut String,
    tag: &str,
    values: &std::collections::BTreeMap<String, String>,
) {
    if let Some(value) = values.get("C") {
        x.push_str(&format!("    <{tag}>{}</{tag}>\n", xml_escape(value)));
    }
    for (locale, value) in values {
        if locale == "C" {
            continue;
        }
        x.push_str(&format!(
            "    <{tag} xml:lang=\"{}\">{}</{tag}>\n",
            xml_escape(locale),
            xml_escape(value)
        ));
    }
}

/// Last-moment category normalization
///
/// Ignored and `X-` vendor categories are dropped, `Feed` is renamed to
/// `News`, and the compound `AudioVideo` is supplemented with its two plain
/// members so either facet matches.
fn fixup_categories(id: &str, categories: &[String], cfg: &Config) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        if cfg.ignore_categories.iter().any(|c| c == category) {
            continue;
        }
        if category.starts_with("X-") {
            continue;
        }
        let category = if category == "Feed" { "News" } else { category };
        if !out.iter().any(|c| c == category) {
            out.push(category.to_string());
        }
    }
    if out.iter().any(|c| c == "AudioVideo") {
        warn!(id, "compound category AudioVideo present, adding Audio and Video");
        for plain in ["Audio", "Video"] {
            if !out.iter().any(|c| c == plain) {
                out.push(plain.to_string());
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AppType, Release, Screenshot};
    use crate::package::PackageInfo;
    use image::{Rgba, RgbaImage};

    fn pkg() -> PackageInfo {
        PackageInfo {
            name: "gimp".into(),
            version: "2.10".into(),
            licence: Some("GPLv3+".into()),
            homepage_url: Some("https://www.gimp.org/".into()),
            source_name: None,
        }
    }

    fn app() -> Application {
        let mut app = Application::new(AppType::Desktop, &pkg());
        app.set_id("gimp.desktop", &Config::default());
        app.names.insert("C".into(), "GIMP".into());
        app.names.insert("de".into(), "GIMP Bildbearbeitung".into());
        app.summaries.insert("C".into(), "Image editor".into());
        app.icon = Some(Icon::Cached("gimp".into()));
        app.categories = vec!["Graphics".into()];
        app
    }

    fn serialize(apps: &[Application], cfg: &Config) -> String {
        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("out.xml");
        write_catalog(apps, cfg, &xml_path, dir.path()).unwrap();
        fs::read_to_string(&xml_path).unwrap()
    }

    #[test]
    fn document_envelope_and_core_fields() {
        let xml = serialize(&[app()], &Config::default());
        assert!(xml.starts_with("<?xml version=\"1.0\"?>\n<applications version=\"0.1\">"));
        assert!(xml.ends_with("</applications>\n"));
        assert!(xml.contains("<id type=\"desktop\">gimp.desktop</id>"));
        assert!(xml.contains("<pkgname>gimp</pkgname>"));
        assert!(xml.contains("<icon type=\"cached\">gimp.png</icon>"));
        assert!(xml.contains("<url type=\"homepage\">https://www.gimp.org/</url>"));
        assert!(xml.contains("<appcategory>Graphics</appcategory>"));
    }

    #[test]
    fn default_locale_name_is_bare_and_unique() {
        let xml = serialize(&[app()], &Config::default());
        assert_eq!(xml.matches("    <name>GIMP</name>").count(), 1);
        assert!(xml.contains("<name xml:lang=\"de\">GIMP Bildbearbeitung</name>"));
    }

    #[test]
    fn text_is_escaped() {
        let mut a = app();
        a.names.insert("C".into(), "Tom & Jerry <3".into());
        let xml = serialize(&[a], &Config::default());
        assert!(xml.contains("<name>Tom &amp; Jerry &lt;3</name>"));
    }

    #[test]
    fn categories_are_fixed_up_at_write_time() {
        let cfg: Config = toml::from_str(r#"ignore_categories = ["GTK"]"#).unwrap();
        let mut a = app();
        a.categories = vec![
            "AudioVideo".into(),
            "GTK".into(),
            "X-Fedora".into(),
            "Feed".into(),
        ];
        let xml = serialize(&[a], &cfg);
        assert!(xml.contains("<appcategory>AudioVideo</appcategory>"));
        assert!(xml.contains("<appcategory>Audio</appcategory>"));
        assert!(xml.contains("<appcategory>Video</appcategory>"));
        assert!(xml.contains("<appcategory>News</appcategory>"));
        assert!(!xml.contains("GTK</appcategory>"));
        assert!(!xml.contains("X-Fedora"));
    }

    #[test]
    fn releases_are_capped_at_three() {
        let mut a = app();
        for i in 0..5 {
            a.releases.push(Release {
                version: format!("1.{i}"),
                timestamp: 1000 + i,
            });
        }
        let xml = serialize(&[a], &Config::default());
        assert_eq!(xml.matches("<release ").count(), 3);
    }

    #[test]
    fn screenshots_need_a_mirror_url() {
        let mut a = app();
        a.screenshots.push(Screenshot::new(
            "gimp",
            RgbaImage::from_pixel(800, 600, Rgba([5, 5, 5, 255])),
            None,
        ));
        let xml = serialize(&[a], &Config::default());
        assert!(!xml.contains("<screenshots>"));
    }

    #[test]
    fn screenshots_are_materialized_with_thumbnails() {
        let cfg: Config = toml::from_str(
            r#"
            [screenshots]
            mirror_url = "https://shots.example/"
            "#,
        )
        .unwrap();
        let mut a = app();
        a.screenshots.push(Screenshot::new(
            "gimp",
            RgbaImage::from_pixel(800, 600, Rgba([5, 5, 5, 255])),
            None,
        ));
        a.screenshots.push(Screenshot::new(
            "gimp",
            RgbaImage::from_pixel(640, 480, Rgba([7, 7, 7, 255])),
            Some("Scripting console".into()),
        ));
        let first = a.screenshots[0].basename.clone();
        let second = a.screenshots[1].basename.clone();

        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("out.xml");
        write_catalog(&[a], &cfg, &xml_path, dir.path()).unwrap();
        let xml = fs::read_to_string(&xml_path).unwrap();

        assert!(xml.contains("<screenshot type=\"default\">"));
        assert!(xml.contains("<screenshot type=\"normal\">"));
        assert!(xml.contains(&format!(
            "<image type=\"source\" width=\"800\" height=\"600\">https://shots.example/source/{first}</image>"
        )));
        assert!(xml.contains(&format!(
            "<image type=\"thumbnail\" width=\"624\" height=\"351\">https://shots.example/624x351/{first}</image>"
        )));
        assert!(xml.contains(&format!(
            "<image type=\"thumbnail\" width=\"112\" height=\"63\">https://shots.example/112x63/{second}</image>"
        )));
        // captions are child elements, never attributes
        assert!(xml.contains("<caption>Scripting console</caption>"));
        assert!(!xml.contains("caption=\""));
        for basename in [&first, &second] {
            assert!(dir.path().join("source").join(basename).is_file());
            assert!(dir.path().join("624x351").join(basename).is_file());
            assert!(dir.path().join("112x63").join(basename).is_file());
        }
    }

    #[test]
    fn fonts_skip_thumbnail_materialization() {
        let cfg: Config = toml::from_str(
            r#"
            [screenshots]
            mirror_url = "https://shots.example"
            "#,
        )
        .unwrap();
        let mut a = app();
        a.thumbnail_screenshots = false;
        a.screenshots.push(Screenshot::new(
            "gimp",
            RgbaImage::from_pixel(640, 200, Rgba([5, 5, 5, 255])),
            Some("Foo Sans".into()),
        ));
        let basename = a.screenshots[0].basename.clone();

        let dir = tempfile::tempdir().unwrap();
        let xml_path = dir.path().join("out.xml");
        write_catalog(&[a], &cfg, &xml_path, dir.path()).unwrap();
        let xml = fs::read_to_string(&xml_path).unwrap();

        assert!(xml.contains("<caption>Foo Sans</caption>"));
        assert!(xml.contains("<image type=\"source\" width=\"640\" height=\"200\">"));
        assert!(!xml.contains("type=\"thumbnail\""));
        assert!(dir.path().join("source").join(&basename).is_file());
        assert!(!dir.path().join("624x351").exists());
    }

    #[test]
    fn icon_archive_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let icons = dir.path().join("icons");
        fs::create_dir_all(&icons).unwrap();
        RgbaImage::from_pixel(64, 64, Rgba([1, 2, 3, 255]))
            .save(icons.join("gimp.png"))
            .unwrap();
        fs::write(icons.join("notes.txt"), "skip me").unwrap();

        let tar_path = dir.path().join("icons.tar");
        write_icon_archive(&tar_path, &icons).unwrap();

        let mut archive = tar::Archive::new(File::open(&tar_path).unwrap());
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["gimp.png"]);
    }
}
