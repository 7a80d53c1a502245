// src/aggregate.rs

//! Accepted-application aggregation and deduplication
//!
//! The aggregator owns accepted applications between rule evaluation and
//! serialization. Applications accumulate until their source-package group is
//! finished, so font families split across sibling subpackages still merge.
//! Deduplication scope is an explicit choice: package-scoped runs forget seen
//! ids when a group finishes, whole-catalog runs remember them across groups
//! so the first occurrence of an id wins globally.

use crate::font::merge_font_families;
use crate::model::Application;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// How far deduplication of application ids reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupScope {
    /// Ids are unique within one source-package group only
    Package,
    /// Ids are unique across the whole catalog run
    Catalog,
}

/// Collects accepted applications for the source group in progress
#[derive(Debug)]
pub struct Aggregator {
    scope: DedupScope,
    seen_ids: HashSet<String>,
    pending: Vec<Application>,
}

impl Aggregator {
    pub fn new(scope: DedupScope) -> Self {
        Self {
            scope,
            seen_ids: HashSet::new(),
            pending: Vec::new(),
        }
    }

    /// Ids already claimed, for the rule engine's duplicate check
    pub fn seen_ids(&self) -> &HashSet<String> {
        &self.seen_ids
    }

    /// Record an accepted application
    pub fn add(&mut self, app: Application) {
        debug!(id = app.id.as_str(), "application accepted");
        self.seen_ids.insert(app.id.clone());
        self.pending.push(app);
    }

    /// Does the group in progress have any accepted content?
    pub fn has_valid_content(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Close out the source group in progress
    ///
    /// Font style variants are folded per family across every package of the
    /// group, with superseded icons removed from `icons_dir`. Package-scoped
    /// runs forget seen ids here.
    pub fn finish_group(&mut self, icons_dir: &Path) -> Vec<Application> {
        let apps = merge_font_families(std::mem::take(&mut self.pending), icons_dir);
        if self.scope == DedupScope::Package {
            self.seen_ids.clear();
        }
        apps
    }
}
