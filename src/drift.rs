//! Drift between a target catalog and the reference catalog.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde::Serialize;

use crate::catalog::{
    DotPath,
    MessageTree,
    flatten_entries,
    read_at,
};
use crate::config::MarkerTable;

/// Kind of discrepancy at one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DriftKind {
    /// In the reference, absent from the target.
    Missing,
    /// Present in the target but still carrying a "needs translation" marker.
    Placeholder,
    /// In the target only. Reported, never written or removed.
    Extra,
}

/// One discrepancy found by a detection pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriftRecord {
    /// Where the discrepancy is.
    pub path: DotPath,
    /// `None` when the path has no leaf in the reference (extras, orphan placeholders).
    pub reference_text: Option<String>,
    /// Target value, for placeholders.
    pub current_text: Option<String>,
    /// What kind of discrepancy it is.
    pub kind: DriftKind,
}

/// The result of [`DriftDetector::detect`] for one locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriftReport {
    /// Target locale.
    pub locale: String,
    /// Reference leaves absent from the target, in reference order.
    pub missing: IndexSet<DotPath>,
    /// Target leaves absent from the reference, in target order.
    pub extra: IndexSet<DotPath>,
    /// Leaves containing a marker, with their current value, in target order.
    pub placeholders: Vec<(DotPath, String)>,
    /// Leaves whose value is the reference text verbatim.
    pub identical: Vec<DotPath>,
}

impl DriftReport {
    /// Nothing to translate. Extras and identical values do not count as drift to fix.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.missing.is_empty() && self.placeholders.is_empty()
    }

    /// Every drift record: missing and placeholder paths in reference traversal order,
    /// then placeholders without a reference leaf, then extras in target order.
    #[must_use]
    pub fn records(&self, reference: &MessageTree) -> Vec<DriftRecord> {
        let placeholder_text = |path: &DotPath| {
            self.placeholders.iter().find(|(p, _)| p == path).map(|(_, text)| text.clone())
        };

        let mut records = Vec::new();

        for (path, text) in flatten_entries(reference) {
            let kind = if self.missing.contains(&path) {
                DriftKind::Missing
            } else if self.placeholders.iter().any(|(p, _)| p == &path) {
                DriftKind::Placeholder
            } else {
                continue;
            };
            let current_text = placeholder_text(&path);
            records.push(DriftRecord {
                path,
                reference_text: Some(text.to_string()),
                current_text,
                kind,
            });
        }

        let in_reference: HashSet<DotPath> = records.iter().map(|r| r.path.clone()).collect();
        for (path, text) in &self.placeholders {
            if in_reference.contains(path) {
                continue;
            }
            records.push(DriftRecord {
                path: path.clone(),
                reference_text: None,
                current_text: Some(text.clone()),
                kind: DriftKind::Placeholder,
            });
        }

        for path in &self.extra {
            records.push(DriftRecord {
                path: path.clone(),
                reference_text: None,
                current_text: None,
                kind: DriftKind::Extra,
            });
        }

        records
    }
}

/// Compares catalogs against the reference using an immutable marker table.
#[derive(Debug, Clone)]
pub struct DriftDetector {
    /// "Needs translation" markers per locale.
    markers: MarkerTable,
}

impl DriftDetector {
    /// Detector recognising the placeholders in `markers`.
    #[must_use]
    pub const fn new(markers: MarkerTable) -> Self {
        Self { markers }
    }

    /// Missing, extra, placeholder and identical-to-reference leaves of `target`.
    ///
    /// A target leaf containing a marker of `locale` is a placeholder. Any other leaf equal
    /// to its non-trivial reference text is reported as identical.
    #[must_use]
    pub fn detect(&self, reference: &MessageTree, target: &MessageTree, locale: &str) -> DriftReport {
        let reference_entries = flatten_entries(reference);
        let target_entries = flatten_entries(target);

        let reference_paths: IndexSet<&DotPath> = reference_entries.iter().map(|(p, _)| p).collect();
        let target_paths: IndexSet<&DotPath> = target_entries.iter().map(|(p, _)| p).collect();

        let missing: IndexSet<DotPath> = reference_paths
            .iter()
            .filter(|path| !target_paths.contains(*path))
            .map(|path| (*path).clone())
            .collect();
        let extra: IndexSet<DotPath> = target_paths
            .iter()
            .filter(|path| !reference_paths.contains(*path))
            .map(|path| (*path).clone())
            .collect();

        let mut placeholders = Vec::new();
        let mut identical = Vec::new();
        for (path, text) in &target_entries {
            if let Some(marker) = self.markers.find_marker(locale, text) {
                tracing::debug!(locale, %path, marker, "Placeholder marker found");
                placeholders.push((path.clone(), (*text).to_string()));
            } else if let Some(reference_text) = read_at(reference, path)
                && reference_text == *text
                && is_non_trivial(reference_text)
            {
                tracing::warn!(locale, %path, "Value identical to reference text, possibly untranslated");
                identical.push(path.clone());
            }
        }

        DriftReport { locale: locale.to_string(), missing, extra, placeholders, identical }
    }
}

/// At least two non-whitespace characters, one of them alphabetic.
///
/// Short tokens, numbers and symbols are commonly identical across languages.
#[must_use]
pub fn is_non_trivial(text: &str) -> bool {
    text.chars().filter(|c| !c.is_whitespace()).count() >= 2 && text.chars().any(char::is_alphabetic)
}
