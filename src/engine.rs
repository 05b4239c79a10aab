//! Per-locale reconciliation: load, diff, translate, merge, persist.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::catalog::{
    CatalogError,
    CatalogFile,
    CatalogStore,
    DotPath,
    MessageTree,
    write_at,
};
use crate::config::{
    IdenticalTranslationPolicy,
    LanguageTagTable,
    SyncSettings,
};
use crate::drift::{
    DriftDetector,
    DriftKind,
    DriftReport,
};
use crate::report::{
    KeyIssue,
    LocaleReport,
    LocaleStatus,
};
use crate::translator::{
    BatchTranslator,
    RetryPolicy,
    TranslationProvider,
    TranslationRequest,
    TranslationResult,
};

/// Why a locale was not reconciled.
#[derive(Error, Debug)]
pub enum LocaleError {
    /// The locale has no language tag for the backend.
    #[error("no language tag configured for locale '{0}'")]
    UnsupportedLocale(String),

    /// Loading or writing the catalog failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Where a locale is in its reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleStage {
    /// Catalog read from disk.
    Loaded,
    /// Drift against the reference computed.
    Diffed,
    /// Drifted entries sent to the backend.
    Translating,
    /// Accepted results written into the tree.
    Merging,
    /// Catalog and backup written.
    Persisted,
    /// Stopped on an error; the catalog is untouched.
    Aborted,
}

/// Merge and call policies, usually taken from [`SyncSettings`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// What to do when the backend echoes the source text.
    pub identical_translation: IdenticalTranslationPolicy,
    /// Fill a missing key with the reference text when its translation failed.
    pub fill_missing_on_failure: bool,
    /// Attempt bound and backoff per key.
    pub retry: RetryPolicy,
    /// Minimum spacing of backend calls.
    pub pacing_interval: Duration,
}

impl EngineOptions {
    /// Options from the `identicalTranslation`, `fillMissingOnFailure` and `translator` settings.
    #[must_use]
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            identical_translation: settings.identical_translation,
            fill_missing_on_failure: settings.fill_missing_on_failure,
            retry: RetryPolicy::from_config(&settings.translator),
            pacing_interval: Duration::from_millis(settings.translator.pacing_interval_ms),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from_settings(&SyncSettings::default())
    }
}

/// What the merge step did with one translation result.
enum Merge {
    /// The backend returned new text.
    Translated,
    /// The backend echoed the source text.
    Unchanged,
    /// Every attempt failed; the reference text fills the missing key.
    FilledFromSource,
    /// Whitespace-only source copied as-is.
    Passthrough,
}

/// Reconciles target catalogs against one reference catalog, one locale at a time.
pub struct ReconciliationEngine {
    /// Catalog files of the messages directory.
    store: CatalogStore,
    /// Drift classification.
    detector: DriftDetector,
    /// Backend language tag per locale.
    tags: LanguageTagTable,
    /// Backend language tag of the reference locale.
    source_tag: String,
    /// Translation backend shared by every locale.
    provider: Arc<dyn TranslationProvider>,
    /// Merge and call policies.
    options: EngineOptions,
}

impl ReconciliationEngine {
    /// Engine translating from `source_tag` through `provider`.
    #[must_use]
    pub fn new(
        store: CatalogStore,
        detector: DriftDetector,
        tags: LanguageTagTable,
        source_tag: impl Into<String>,
        provider: Arc<dyn TranslationProvider>,
        options: EngineOptions,
    ) -> Self {
        Self { store, detector, tags, source_tag: source_tag.into(), provider, options }
    }

    /// Detection only. The catalog is read but never written.
    #[must_use]
    pub fn check(&self, reference: &MessageTree, locale: &str) -> LocaleReport {
        let catalog = match self.store.load(locale) {
            Ok(catalog) => catalog,
            Err(e) => return abort(locale, LocaleStage::Loaded, &e.into()),
        };

        let drift = self.detector.detect(reference, &catalog.tree, locale);
        if self.tags.tag_for(locale).is_none() {
            tracing::warn!(locale, "No language tag configured, sync would skip this locale");
        }
        log_drift(&drift);
        LocaleReport::from_drift(&drift, LocaleStatus::Checked)
    }

    /// Runs the full state machine for `locale`. Failures are captured in the report;
    /// the on-disk catalog is only touched by the final persist.
    pub async fn reconcile(&self, reference: &MessageTree, locale: &str) -> LocaleReport {
        let mut catalog = match self.store.load(locale) {
            Ok(catalog) => catalog,
            Err(e) => return abort(locale, LocaleStage::Loaded, &e.into()),
        };
        enter(locale, LocaleStage::Loaded);

        let drift = self.detector.detect(reference, &catalog.tree, locale);
        enter(locale, LocaleStage::Diffed);
        log_drift(&drift);

        if drift.is_consistent() {
            tracing::info!(locale, "Catalog is up to date");
            return LocaleReport::from_drift(&drift, LocaleStatus::Consistent);
        }

        let Some(target_tag) = self.tags.tag_for(locale) else {
            let error = LocaleError::UnsupportedLocale(locale.to_string());
            tracing::warn!(locale, %error, "Skipping locale");
            return LocaleReport::from_drift(&drift, LocaleStatus::Skipped { reason: error.to_string() });
        };

        enter(locale, LocaleStage::Translating);
        let mut report = LocaleReport::from_drift(&drift, LocaleStatus::Consistent);
        let (requests, kinds) = collect_requests(&drift, reference, &mut report);
        let mut batch = BatchTranslator::new(
            Arc::clone(&self.provider),
            self.options.retry,
            self.options.pacing_interval,
            self.source_tag.as_str(),
            target_tag,
        );
        let results = batch.translate_all(requests).await;

        enter(locale, LocaleStage::Merging);
        let writes = self.merge(&mut catalog, &results, &kinds, &mut report);

        if writes.is_empty() {
            tracing::info!(locale, failed = report.failed.len(), "No accepted translations, nothing written");
            report.status =
                LocaleStatus::Persisted { writes: 0, backup: None, format_preserved: true };
            return report;
        }

        match self.store.persist(&catalog, &writes) {
            Ok(outcome) => {
                enter(locale, LocaleStage::Persisted);
                tracing::info!(
                    locale,
                    writes = writes.len(),
                    failed = report.failed.len(),
                    path = %outcome.path.display(),
                    "Catalog updated"
                );
                report.status = LocaleStatus::Persisted {
                    writes: writes.len(),
                    backup: outcome.backup,
                    format_preserved: outcome.format_preserved,
                };
                report
            }
            Err(e) => {
                let error = LocaleError::from(e);
                tracing::error!(locale, stage = ?LocaleStage::Merging, %error, "Locale aborted");
                enter(locale, LocaleStage::Aborted);
                report.status = LocaleStatus::Aborted { error: error.to_string() };
                report
            }
        }
    }

    /// Applies accepted results to the catalog tree and returns the writes made.
    fn merge(
        &self,
        catalog: &mut CatalogFile,
        results: &[TranslationResult],
        kinds: &HashMap<DotPath, DriftKind>,
        report: &mut LocaleReport,
    ) -> Vec<(DotPath, String)> {
        let mut writes = Vec::new();

        for result in results {
            let kind = kinds.get(&result.path).copied().unwrap_or(DriftKind::Placeholder);
            let (value, merge) = match (&result.outcome, result.changed_text()) {
                (Ok(text), _) if result.attempts == 0 => (text.clone(), Merge::Passthrough),
                (Ok(_), Some(text)) => (text.to_string(), Merge::Translated),
                (Ok(text), None) => match self.options.identical_translation {
                    IdenticalTranslationPolicy::Accept => {
                        tracing::warn!(path = %result.path, "Backend returned the source text unchanged");
                        (text.clone(), Merge::Unchanged)
                    }
                    IdenticalTranslationPolicy::Skip => {
                        tracing::warn!(path = %result.path, "Backend returned the source text unchanged, not written");
                        report.unchanged.push(result.path.clone());
                        continue;
                    }
                },
                (Err(e), _) => {
                    report.failed.push(KeyIssue { path: result.path.clone(), message: e.to_string() });
                    if kind == DriftKind::Missing && self.options.fill_missing_on_failure {
                        (result.source_text.clone(), Merge::FilledFromSource)
                    } else {
                        continue;
                    }
                }
            };

            if let Err(conflict) = write_at(&mut catalog.tree, &result.path, value.as_str()) {
                tracing::warn!(path = %result.path, %conflict, "Cannot merge translation");
                report.conflicts.push(KeyIssue { path: result.path.clone(), message: conflict.to_string() });
                continue;
            }
            match merge {
                Merge::Translated => report.translated.push(result.path.clone()),
                Merge::Unchanged => report.unchanged.push(result.path.clone()),
                Merge::FilledFromSource | Merge::Passthrough => {}
            }
            writes.push((result.path.clone(), value));
        }

        writes
    }
}

/// Drifted entries that have reference text, in reference order.
fn collect_requests(
    drift: &DriftReport,
    reference: &MessageTree,
    report: &mut LocaleReport,
) -> (Vec<TranslationRequest>, HashMap<DotPath, DriftKind>) {
    let mut requests = Vec::new();
    let mut kinds = HashMap::new();

    for record in drift.records(reference) {
        if record.kind == DriftKind::Extra {
            continue;
        }
        let Some(text) = record.reference_text else {
            tracing::warn!(locale = %drift.locale, path = %record.path, "No reference text, skipping");
            report.skipped.push(record.path);
            continue;
        };
        kinds.insert(record.path.clone(), record.kind);
        requests.push(TranslationRequest { path: record.path, text });
    }

    (requests, kinds)
}

/// Logs a stage transition.
fn enter(locale: &str, stage: LocaleStage) {
    tracing::debug!(locale, ?stage, "Locale stage");
}

/// Logs drift counts for one locale.
fn log_drift(drift: &DriftReport) {
    tracing::info!(
        locale = %drift.locale,
        missing = drift.missing.len(),
        extra = drift.extra.len(),
        untranslated = drift.placeholders.len(),
        identical = drift.identical.len(),
        "Drift detected"
    );
}

/// Aborted report carrying the error text.
fn abort(locale: &str, stage: LocaleStage, error: &LocaleError) -> LocaleReport {
    tracing::error!(locale, ?stage, %error, "Locale aborted");
    enter(locale, LocaleStage::Aborted);
    LocaleReport::new(locale, LocaleStatus::Aborted { error: error.to_string() })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::fs;

    use googletest::prelude::*;
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;
    use crate::catalog::read_at;
    use crate::config::MarkerTable;
    use crate::test_utils::{
        ScriptedProvider,
        tree,
    };

    fn path(text: &str) -> DotPath {
        DotPath::parse(text, ".")
    }

    fn engine(dir: &TempDir, provider: Arc<ScriptedProvider>, options: EngineOptions) -> ReconciliationEngine {
        let settings = SyncSettings::default();
        ReconciliationEngine::new(
            CatalogStore::new(dir.path(), ".backup"),
            DriftDetector::new(MarkerTable::from_settings(&settings)),
            LanguageTagTable::from_settings(&settings),
            "eng_Latn",
            provider,
            options,
        )
    }

    fn write_catalog(dir: &TempDir, locale: &str, value: &serde_json::Value) {
        fs::write(dir.path().join(format!("{locale}.json")), serde_json::to_string_pretty(value).unwrap())
            .unwrap();
    }

    fn read_catalog(dir: &TempDir, locale: &str) -> MessageTree {
        let text = fs::read_to_string(dir.path().join(format!("{locale}.json"))).unwrap();
        tree(&serde_json::from_str(&text).unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn missing_key_is_translated_and_written() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider, EngineOptions::default());
        let reference = tree(&json!({ "a": { "b": "Hello" } }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.missing, len(eq(1)));
        assert_that!(report.translated, elements_are![eq(&path("a.b"))]);
        assert!(matches!(report.status, LocaleStatus::Persisted { writes: 1, backup: None, .. }));
        assert_that!(read_at(&read_catalog(&dir, "zh"), &path("a.b")), some(eq("zh:Hello")));
    }

    #[tokio::test(start_paused = true)]
    async fn consistent_locale_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "x": "嗨" }));
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_eq!(report.status, LocaleStatus::Consistent);
        assert_eq!(provider.call_count(), 0);
        assert!(!dir.path().join("zh.json.backup").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_locale_is_skipped_with_counts() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::prefixing("xx:"));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi" }));

        let report = engine.reconcile(&reference, "xx").await;

        assert!(matches!(report.status, LocaleStatus::Skipped { .. }));
        assert_eq!(report.missing.len(), 1);
        assert_eq!(provider.call_count(), 0);
        assert!(!dir.path().join("xx.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn corrupt_catalog_aborts_without_writing() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("zh.json"), "{ broken").unwrap();
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert!(report.aborted());
        assert_eq!(fs::read_to_string(dir.path().join("zh.json")).unwrap(), "{ broken");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn identical_result_is_accepted_and_flagged() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "brand": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::prefixing(""));
        let engine = engine(&dir, provider, EngineOptions::default());
        let reference = tree(&json!({ "brand": "Acme" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.unchanged, elements_are![eq(&path("brand"))]);
        assert_that!(read_at(&read_catalog(&dir, "zh"), &path("brand")), some(eq("Acme")));
    }

    #[tokio::test(start_paused = true)]
    async fn identical_result_is_skipped_by_policy() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "brand": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::prefixing(""));
        let options = EngineOptions {
            identical_translation: IdenticalTranslationPolicy::Skip,
            ..EngineOptions::default()
        };
        let engine = engine(&dir, provider, options);
        let reference = tree(&json!({ "brand": "Acme" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.unchanged, elements_are![eq(&path("brand"))]);
        assert!(matches!(report.status, LocaleStatus::Persisted { writes: 0, .. }));
        assert_that!(read_at(&read_catalog(&dir, "zh"), &path("brand")), some(eq("待翻译")));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_placeholder_keeps_marker_and_failed_missing_gets_source() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "x": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::failing(500));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi", "z": "Zed" }));

        let report = engine.reconcile(&reference, "zh").await;

        let catalog = read_catalog(&dir, "zh");
        assert_that!(read_at(&catalog, &path("x")), some(eq("待翻译")));
        assert_that!(read_at(&catalog, &path("z")), some(eq("Zed")));
        assert_that!(report.failed, len(eq(2)));
        assert_eq!(provider.call_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_missing_key_left_out_without_fill() {
        let dir = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::failing(500));
        let options = EngineOptions { fill_missing_on_failure: false, ..EngineOptions::default() };
        let engine = engine(&dir, provider, options);
        let reference = tree(&json!({ "z": "Zed" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.failed, len(eq(1)));
        assert!(!dir.path().join("zh.json").exists());
    }

    #[tokio::test(start_paused = true)]
    async fn structural_conflict_is_reported_per_key() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "a": "flat", "other": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider, EngineOptions::default());
        let reference = tree(&json!({ "a": { "b": "Hello" }, "other": "Other" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.conflicts, elements_are![field!(KeyIssue.path, eq(&path("a.b")))]);
        assert_that!(report.translated, elements_are![eq(&path("other"))]);
        let catalog = read_catalog(&dir, "zh");
        assert_that!(read_at(&catalog, &path("a")), some(eq("flat")));
        assert_that!(read_at(&catalog, &path("other")), some(eq("zh:Other")));
    }

    #[tokio::test(start_paused = true)]
    async fn orphan_placeholder_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "x": "嗨", "gone": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi" }));

        let report = engine.reconcile(&reference, "zh").await;

        assert_that!(report.skipped, elements_are![eq(&path("gone"))]);
        assert_eq!(provider.call_count(), 0);
        assert_that!(read_at(&read_catalog(&dir, "zh"), &path("gone")), some(eq("待翻译")));
    }

    #[rstest::rstest]
    fn check_never_writes() {
        let dir = TempDir::new().unwrap();
        write_catalog(&dir, "zh", &json!({ "x": "待翻译" }));
        let provider = Arc::new(ScriptedProvider::prefixing("zh:"));
        let engine = engine(&dir, provider.clone(), EngineOptions::default());
        let reference = tree(&json!({ "x": "Hi", "y": "Bye" }));
        let before = fs::read_to_string(dir.path().join("zh.json")).unwrap();

        let report = engine.check(&reference, "zh");

        assert_eq!(report.status, LocaleStatus::Checked);
        assert_eq!(report.missing, vec![path("y")]);
        assert_eq!(report.untranslated, vec![path("x")]);
        assert_eq!(provider.call_count(), 0);
        assert_eq!(fs::read_to_string(dir.path().join("zh.json")).unwrap(), before);
    }
}
