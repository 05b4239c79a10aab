//! Run report: per-locale outcomes, undefined code keys and their rendering.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::catalog::DotPath;
use crate::drift::DriftReport;
use crate::usage::UndefinedKey;

/// Number of sample paths shown per category in the text summary.
const SAMPLE_SIZE: usize = 3;

/// How processing of one locale ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum LocaleStatus {
    /// Drift was fixed and the catalog rewritten.
    #[serde(rename_all = "camelCase")]
    Persisted {
        /// Keys written.
        writes: usize,
        /// Copy of the previous file; `None` for a new catalog or no writes.
        backup: Option<PathBuf>,
        /// Untouched lines kept their original formatting.
        format_preserved: bool,
    },
    /// Nothing to write.
    Consistent,
    /// Detection only.
    Checked,
    /// No language tag for the locale; nothing translated.
    Skipped {
        /// Why nothing was translated.
        reason: String,
    },
    /// The locale could not be processed; its catalog was left untouched.
    Aborted {
        /// The error that stopped the locale.
        error: String,
    },
}

/// A key-level problem that did not stop the locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyIssue {
    /// Affected key.
    pub path: DotPath,
    /// What went wrong.
    pub message: String,
}

/// Outcome of one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocaleReport {
    /// Locale code.
    pub locale: String,
    /// How processing ended.
    #[serde(flatten)]
    pub status: LocaleStatus,
    /// Drift found before any write.
    pub missing: Vec<DotPath>,
    /// Keys absent from the reference.
    pub extra: Vec<DotPath>,
    /// Keys still holding a placeholder marker.
    pub untranslated: Vec<DotPath>,
    /// Keys equal to the reference text; reported only.
    pub identical_to_reference: Vec<DotPath>,
    /// Keys written with a new translation.
    pub translated: Vec<DotPath>,
    /// Backend returned the source text unchanged; possibly untranslated.
    pub unchanged: Vec<DotPath>,
    /// Keys whose translation failed after every attempt.
    pub failed: Vec<KeyIssue>,
    /// Drifted paths without a reference leaf.
    pub skipped: Vec<DotPath>,
    /// Writes blocked by a structural conflict in the catalog.
    pub conflicts: Vec<KeyIssue>,
}

impl LocaleReport {
    /// Report with no keys listed.
    #[must_use]
    pub fn new(locale: impl Into<String>, status: LocaleStatus) -> Self {
        Self {
            locale: locale.into(),
            status,
            missing: Vec::new(),
            extra: Vec::new(),
            untranslated: Vec::new(),
            identical_to_reference: Vec::new(),
            translated: Vec::new(),
            unchanged: Vec::new(),
            failed: Vec::new(),
            skipped: Vec::new(),
            conflicts: Vec::new(),
        }
    }

    /// Report seeded with the counts of a detection pass.
    #[must_use]
    pub fn from_drift(drift: &DriftReport, status: LocaleStatus) -> Self {
        Self {
            missing: drift.missing.iter().cloned().collect(),
            extra: drift.extra.iter().cloned().collect(),
            untranslated: drift.placeholders.iter().map(|(path, _)| path.clone()).collect(),
            identical_to_reference: drift.identical.clone(),
            ..Self::new(drift.locale.clone(), status)
        }
    }

    /// No missing and no untranslated keys.
    #[must_use]
    pub fn complete(&self) -> bool {
        self.missing.is_empty() && self.untranslated.is_empty()
    }

    /// The locale stopped on an error.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        matches!(self.status, LocaleStatus::Aborted { .. })
    }
}

/// Outcome of one run over every selected locale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Reference locale code.
    pub reference_locale: String,
    /// Leaves in the reference catalog.
    pub reference_keys: usize,
    /// Per-locale outcomes in processing order.
    pub locales: Vec<LocaleReport>,
    /// Keys used in source code but absent from the reference catalog.
    pub undefined_keys: Vec<UndefinedKey>,
    /// Distinct keys found in source code.
    pub used_keys: usize,
}

impl RunReport {
    /// Empty report for `reference_locale`.
    #[must_use]
    pub fn new(reference_locale: impl Into<String>, reference_keys: usize) -> Self {
        Self { reference_locale: reference_locale.into(), reference_keys, ..Self::default() }
    }

    /// Any locale with missing, untranslated or extra keys, or undefined keys in code.
    #[must_use]
    pub fn has_drift(&self) -> bool {
        !self.undefined_keys.is_empty()
            || self.locales.iter().any(|l| !l.complete() || !l.extra.is_empty())
    }

    /// Any locale stopped on an error.
    #[must_use]
    pub fn has_aborted(&self) -> bool {
        self.locales.iter().any(LocaleReport::aborted)
    }

    /// No drift and every locale was processed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.has_drift() && !self.has_aborted()
    }

    /// Failed keys across all locales.
    #[must_use]
    pub fn failed_translations(&self) -> usize {
        self.locales.iter().map(|l| l.failed.len()).sum()
    }

    /// Codes of the locales matching `predicate`.
    fn bucket(&self, predicate: impl Fn(&LocaleReport) -> bool) -> Vec<&str> {
        self.locales.iter().filter(|l| predicate(l)).map(|l| l.locale.as_str()).collect()
    }
}

/// Writes a count line with up to three sample paths.
fn write_samples(f: &mut fmt::Formatter<'_>, label: &str, paths: &[DotPath]) -> fmt::Result {
    if paths.is_empty() {
        return Ok(());
    }
    let samples: Vec<String> = paths.iter().take(SAMPLE_SIZE).map(ToString::to_string).collect();
    let more = if paths.len() > SAMPLE_SIZE { ", ..." } else { "" };
    writeln!(f, "    {label}: {} ({}{more})", paths.len(), samples.join(", "))
}

/// Writes a count line and up to three issues.
fn write_issues(f: &mut fmt::Formatter<'_>, label: &str, issues: &[KeyIssue]) -> fmt::Result {
    if issues.is_empty() {
        return Ok(());
    }
    writeln!(f, "    {label}: {}", issues.len())?;
    for issue in issues.iter().take(SAMPLE_SIZE) {
        writeln!(f, "      {}: {}", issue.path, issue.message)?;
    }
    Ok(())
}

/// Writes the locales of one summary category.
fn write_bucket(f: &mut fmt::Formatter<'_>, label: &str, locales: &[&str]) -> fmt::Result {
    if locales.is_empty() {
        writeln!(f, "  {label}: none")
    } else {
        writeln!(f, "  {label}: {}", locales.join(", "))
    }
}

impl fmt::Display for LocaleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Persisted { writes: 0, .. } => f.write_str("nothing written"),
            Self::Persisted { writes, backup: Some(backup), .. } => {
                write!(f, "wrote {writes} key(s), backup at {}", backup.display())
            }
            Self::Persisted { writes, backup: None, .. } => {
                write!(f, "wrote {writes} key(s) to a new catalog")
            }
            Self::Consistent => f.write_str("up to date"),
            Self::Checked => f.write_str("checked"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
            Self::Aborted { error } => write!(f, "aborted: {error}"),
        }
    }
}

impl fmt::Display for LocaleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {} ({})", self.locale, self.status)?;
        write_samples(f, "missing", &self.missing)?;
        write_samples(f, "extra", &self.extra)?;
        write_samples(f, "untranslated", &self.untranslated)?;
        write_samples(f, "identical to reference", &self.identical_to_reference)?;
        write_samples(f, "translated", &self.translated)?;
        write_samples(f, "unchanged by backend", &self.unchanged)?;
        write_samples(f, "skipped (no reference text)", &self.skipped)?;
        write_issues(f, "failed", &self.failed)?;
        write_issues(f, "conflicts", &self.conflicts)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Reference: {} ({} keys)", self.reference_locale, self.reference_keys)?;
        writeln!(f)?;
        writeln!(f, "Locales:")?;
        for locale in &self.locales {
            write!(f, "{locale}")?;
        }
        writeln!(f)?;
        writeln!(f, "Summary:")?;
        write_bucket(f, "complete", &self.bucket(|l| !l.aborted() && l.complete()))?;
        write_bucket(f, "missing keys", &self.bucket(|l| !l.missing.is_empty()))?;
        write_bucket(f, "extra keys", &self.bucket(|l| !l.extra.is_empty()))?;
        write_bucket(f, "untranslated", &self.bucket(|l| !l.untranslated.is_empty()))?;
        write_bucket(f, "aborted", &self.bucket(LocaleReport::aborted))?;
        let failed = self.failed_translations();
        if failed > 0 {
            writeln!(f, "  failed translations: {failed}")?;
        }

        if self.undefined_keys.is_empty() {
            writeln!(f, "  undefined keys in code: none ({} used)", self.used_keys)?;
        } else {
            writeln!(
                f,
                "  undefined keys in code: {} ({} used)",
                self.undefined_keys.len(),
                self.used_keys
            )?;
            for key in &self.undefined_keys {
                writeln!(f, "    {key}")?;
            }
        }
        Ok(())
    }
}
