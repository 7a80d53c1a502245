// src/build.rs

//! The batch build driver
//!
//! Walks binary packages through the whole pipeline: gate, extract into a
//! throwaway work area, parse, evaluate, aggregate and emit. Packages are
//! grouped by their originating source package, so subpackages of one source
//! share an extracted tree and icon work area; font families split across
//! subpackages merge and the group's applications are serialized together.
//! Output files for a group are staged and only moved into the output
//! directory once everything has been written, so a crash never leaves a
//! half-written catalog behind.

use crate::aggregate::{Aggregator, DedupScope};
use crate::catalog;
use crate::config::{glob_matches, Config};
use crate::content::{self, ContentType, ParserContext};
use crate::error::Result;
use crate::model::Application;
use crate::package::{self, PackageInfo, INTERESTING_PATHS};
use crate::rules::{self, Verdict};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Counters for one batch run, per source group
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildSummary {
    pub built: usize,
    pub no_content: usize,
    pub skipped: usize,
    pub failed: usize,
    pub applications: usize,
}

/// Outcome of processing one source group
#[derive(Debug, PartialEq, Eq)]
enum GroupOutcome {
    Built(usize),
    NoContent,
    Skipped,
}

/// Binary packages sharing one originating source package
#[derive(Debug)]
struct SourceGroup {
    name: String,
    members: Vec<(PackageInfo, PathBuf)>,
}

/// Drives the pipeline over a batch of packages
pub struct Builder {
    cfg: Config,
    output_dir: PathBuf,
    aggregator: Aggregator,
}

impl Builder {
    pub fn new(cfg: Config, output_dir: &Path, scope: DedupScope) -> Self {
        Self {
            cfg,
            output_dir: output_dir.to_path_buf(),
            aggregator: Aggregator::new(scope),
        }
    }

    /// Process every package, one failure never stopping the batch
    pub fn build_all(&mut self, packages: &[PathBuf]) -> BuildSummary {
        let mut summary = BuildSummary::default();
        let mut infos: Vec<(PackageInfo, PathBuf)> = Vec::new();
        for path in packages {
            match PackageInfo::read(path) {
                Ok(info) => infos.push((info, path.clone())),
                Err(e) => {
                    error!(package = %path.display(), "unreadable package: {e}");
                    summary.failed += 1;
                }
            }
        }

        let companions = companion_map(&infos);
        for group in group_by_source(infos) {
            match self.build_group(&group, &companions) {
                Ok(GroupOutcome::Built(count)) => {
                    summary.built += 1;
                    summary.applications += count;
                }
                Ok(GroupOutcome::NoContent) => summary.no_content += 1,
                Ok(GroupOutcome::Skipped) => {
                    debug!(group = group.name.as_str(), "skipped");
                    summary.skipped += 1;
                }
                Err(e) => {
                    error!(group = group.name.as_str(), "group failed: {e}");
                    summary.failed += 1;
                }
            }
        }
        info!(
            built = summary.built,
            no_content = summary.no_content,
            skipped = summary.skipped,
            failed = summary.failed,
            applications = summary.applications,
            "batch finished"
        );
        summary
    }

    fn build_group(
        &mut self,
        group: &SourceGroup,
        companions: &BTreeMap<String, PathBuf>,
    ) -> Result<GroupOutcome> {
        let mut members: Vec<(&PackageInfo, &PathBuf)> = Vec::new();
        for (pkg, path) in &group.members {
            if glob_matches(&self.cfg.blacklist.packages, &pkg.name) {
                debug!(package = pkg.name.as_str(), "package is blacklisted");
                continue;
            }
            if !PackageInfo::contains_interesting_files(path, INTERESTING_PATHS)? {
                debug!(package = pkg.name.as_str(), "no interesting files");
                continue;
            }
            members.push((pkg, path));
        }
        if members.is_empty() {
            return Ok(GroupOutcome::Skipped);
        }
        info!(group = group.name.as_str(), packages = members.len(), "processing");

        let work = tempfile::Builder::new()
            .prefix("appstream-forge-")
            .tempdir()?;
        let tree_root = work.path().join("tree");
        let icons_dir = work.path().join("icons");
        fs::create_dir_all(&tree_root)?;
        fs::create_dir_all(&icons_dir)?;

        // everything lands in the shared tree before any parsing starts, so
        // icon and AppData lookups can cross subpackage boundaries
        let mut owned: Vec<(&PackageInfo, Vec<PathBuf>)> = Vec::new();
        for (pkg, path) in members {
            info!(package = pkg.name.as_str(), version = pkg.version.as_str(), "extracting");
            let mut files = package::extract(path, &tree_root, INTERESTING_PATHS)?;
            for data in self.cfg.package_data_for(&pkg.name) {
                match companions.get(data) {
                    Some(companion) => {
                        debug!(package = pkg.name.as_str(), companion = data, "co-extracting");
                        files.extend(package::extract(companion, &tree_root, INTERESTING_PATHS)?);
                    }
                    None => warn!(package = pkg.name.as_str(), companion = data, "companion package not in batch"),
                }
            }
            files.sort();
            files.dedup();
            owned.push((pkg, files));
        }

        for (pkg, files) in owned {
            let ctx = ParserContext {
                cfg: &self.cfg,
                pkg,
                tree_root: &tree_root,
                icons_dir: &icons_dir,
            };
            let mut codec_paths: Vec<PathBuf> = Vec::new();
            for relative in &files {
                let Some(content_type) = ContentType::classify(relative) else {
                    continue;
                };
                let file = tree_root.join(relative);
                if content_type == ContentType::Codec {
                    codec_paths.push(file);
                    continue;
                }
                let outcome = content::parse(&ctx, content_type, &file)?;
                judge(&mut self.aggregator, outcome, &ctx, relative)?;
            }
            if !codec_paths.is_empty() {
                let outcome = content::codec::parse_package(&ctx, &codec_paths)?;
                judge(&mut self.aggregator, outcome, &ctx, Path::new("gstreamer plugins"))?;
            }
        }

        if !self.aggregator.has_valid_content() {
            self.aggregator.finish_group(&icons_dir);
            return Ok(GroupOutcome::NoContent);
        }
        let apps = self.aggregator.finish_group(&icons_dir);
        self.emit(&group.name, &apps, &icons_dir)?;
        Ok(GroupOutcome::Built(apps.len()))
    }

    /// Write group outputs through a staging directory
    fn emit(&self, group: &str, apps: &[Application], icons_dir: &Path) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        let staging = self.output_dir.join(format!(".{group}.partial"));
        package::remove_work_area(&staging);
        fs::create_dir_all(&staging)?;

        let result = self.emit_into(&staging, group, apps, icons_dir);
        if result.is_err() {
            package::remove_work_area(&staging);
            return result;
        }

        // staging lives inside the output directory, so these are renames on
        // one filesystem
        let xml_name = format!("{group}.xml");
        fs::rename(staging.join(&xml_name), self.output_dir.join(&xml_name))?;
        let tar_name = format!("{group}-icons.tar");
        if staging.join(&tar_name).exists() {
            fs::rename(staging.join(&tar_name), self.output_dir.join(&tar_name))?;
        }
        let shots = staging.join("screenshots");
        if shots.is_dir() {
            move_tree(&shots, &self.output_dir.join("screenshots"))?;
        }
        package::remove_work_area(&staging);
        info!(group, applications = apps.len(), "emitted");
        Ok(())
    }

    fn emit_into(
        &self,
        staging: &Path,
        group: &str,
        apps: &[Application],
        icons_dir: &Path,
    ) -> Result<()> {
        let xml_path = staging.join(format!("{group}.xml"));
        catalog::write_catalog(apps, &self.cfg, &xml_path, &staging.join("screenshots"))?;

        let has_icons = fs::read_dir(icons_dir)?.next().is_some();
        if has_icons {
            catalog::write_icon_archive(&staging.join(format!("{group}-icons.tar")), icons_dir)?;
        }
        Ok(())
    }
}

/// Evaluate one parse outcome and hand accepted applications to `aggregator`
fn judge(
    aggregator: &mut Aggregator,
    outcome: content::ParseOutcome,
    ctx: &ParserContext,
    source: &Path,
) -> Result<()> {
    match outcome {
        content::ParseOutcome::Accepted(mut app) => {
            match rules::evaluate(&mut app, ctx, aggregator.seen_ids())? {
                Verdict::Accept => aggregator.add(*app),
                Verdict::Reject(reason) => {
                    info!(id = app.id_full.as_str(), "ignored: {reason}");
                }
            }
        }
        content::ParseOutcome::Rejected(reason) => {
            debug!(source = %source.display(), "not parsed: {reason}");
        }
    }
    Ok(())
}

/// Map package name to path, so configured companions can be co-extracted
fn companion_map(infos: &[(PackageInfo, PathBuf)]) -> BTreeMap<String, PathBuf> {
    infos
        .iter()
        .map(|(info, path)| (info.name.clone(), path.clone()))
        .collect()
}

/// Group a batch by originating source package
///
/// A package without a recorded source forms a group of one under its own
/// name. Group order is deterministic; member order follows the batch.
fn group_by_source(infos: Vec<(PackageInfo, PathBuf)>) -> Vec<SourceGroup> {
    let mut groups: BTreeMap<String, Vec<(PackageInfo, PathBuf)>> = BTreeMap::new();
    for (info, path) in infos {
        let key = info
            .source_name
            .clone()
            .unwrap_or_else(|| info.name.clone());
        groups.entry(key).or_default().push((info, path));
    }
    groups
        .into_iter()
        .map(|(name, members)| SourceGroup { name, members })
        .collect()
}

/// Move every file under `src` into `dst`, preserving the directory layout
fn move_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(src)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| crate::error::Error::Other(e.to_string()))?;
        let target = dst.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::rename(entry.path(), &target)?;
    }
    Ok(())
}
