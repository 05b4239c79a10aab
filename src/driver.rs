//! Runs reconciliation over every configured locale and assembles the run report.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::catalog::{
    CatalogError,
    CatalogStore,
    MessageTree,
    flatten,
};
use crate::config::{
    ConfigError,
    ConfigManager,
    LanguageTagTable,
    MarkerTable,
    ValidationError,
};
use crate::drift::DriftDetector;
use crate::engine::{
    EngineOptions,
    ReconciliationEngine,
};
use crate::report::RunReport;
use crate::translator::{
    HttpTranslator,
    TranslationError,
    TranslationProvider,
};
use crate::usage::{
    UsageError,
    UsageReport,
    UsageScanner,
    find_undefined,
};

/// Errors that stop the whole run.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The reference catalog is absent or unreadable.
    #[error("Reference catalog '{locale}' could not be loaded: {source}")]
    ReferenceMissing {
        /// Reference locale code.
        locale: String,
        /// Load failure.
        #[source]
        source: CatalogError,
    },

    /// Settings are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The messages directory could not be listed.
    #[error("Failed to discover locales: {0}")]
    Discovery(#[source] CatalogError),

    /// The HTTP backend could not be built.
    #[error("Failed to set up the translation backend: {0}")]
    Translator(#[from] TranslationError),
}

/// Whether a run writes catalogs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Detection only, nothing written.
    #[default]
    Check,
    /// Translate drifted keys and persist the catalogs.
    Sync,
}

/// Per-run choices from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Check or sync.
    pub mode: RunMode,
    /// Restricts the run to these locales, in this order. Empty means every configured locale.
    pub locales: Vec<String>,
}

/// Runs one check or sync over the workspace.
pub struct Driver {
    /// Validated settings and workspace root.
    config: ConfigManager,
    /// Translation backend handed to the engine.
    provider: Arc<dyn TranslationProvider>,
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver").field("config", &self.config).finish_non_exhaustive()
    }
}

impl Driver {
    /// Driver translating through `provider`.
    #[must_use]
    pub fn new(config: ConfigManager, provider: Arc<dyn TranslationProvider>) -> Self {
        Self { config, provider }
    }

    /// Uses the HTTP backend described by the settings.
    ///
    /// # Errors
    /// Returns `SyncError::Translator` if the HTTP client cannot be built.
    pub fn with_http_provider(config: ConfigManager) -> Result<Self, SyncError> {
        let provider = HttpTranslator::new(&config.get_settings().translator)?;
        Ok(Self::new(config, Arc::new(provider)))
    }

    /// Processes locales in order. Only a missing reference catalog, an unresolvable
    /// locale list or invalid settings fail the run; per-locale failures end up in the report.
    ///
    /// # Errors
    /// See [`SyncError`].
    pub async fn run(&self, options: &RunOptions) -> Result<RunReport, SyncError> {
        let settings = self.config.get_settings();
        let store = CatalogStore::new(self.config.messages_dir(), settings.backup_suffix.as_str());

        let reference = store.load_existing(&settings.reference_locale).map_err(|source| {
            SyncError::ReferenceMissing { locale: settings.reference_locale.clone(), source }
        })?;
        let locales = self.resolve_locales(&store, &options.locales)?;
        tracing::info!(
            reference = %settings.reference_locale,
            mode = ?options.mode,
            locales = ?locales,
            "Starting run"
        );

        let tags = LanguageTagTable::from_settings(settings);
        let source_tag = settings
            .translator
            .source_lang_tag
            .clone()
            .or_else(|| tags.tag_for(&settings.reference_locale).map(str::to_string))
            .ok_or_else(|| {
                ConfigError::ValidationErrors(vec![ValidationError::new(
                    "languageTags",
                    format!("No language tag for reference locale '{}'", settings.reference_locale),
                )])
            })?;

        let engine = ReconciliationEngine::new(
            store,
            DriftDetector::new(MarkerTable::from_settings(settings)),
            tags,
            source_tag,
            Arc::clone(&self.provider),
            EngineOptions::from_settings(settings),
        );

        let mut report = RunReport::new(settings.reference_locale.as_str(), flatten(&reference).len());
        for locale in &locales {
            let locale_report = match options.mode {
                RunMode::Check => engine.check(&reference, locale),
                RunMode::Sync => engine.reconcile(&reference, locale).await,
            };
            report.locales.push(locale_report);
        }

        if settings.usage.enabled {
            match self.scan_usage(&reference).await {
                Ok(usage) => {
                    report.used_keys = usage.used_keys;
                    report.undefined_keys = usage.undefined;
                }
                Err(e) => tracing::warn!("Usage scan failed: {e}"),
            }
        }

        Ok(report)
    }

    /// The `--locale` filter if given, else `locales` from the settings, else every
    /// catalog in the messages directory. The reference locale is never a target.
    fn resolve_locales(&self, store: &CatalogStore, filter: &[String]) -> Result<Vec<String>, SyncError> {
        let settings = self.config.get_settings();
        let reference = &settings.reference_locale;

        let candidates = if !filter.is_empty() {
            filter.to_vec()
        } else if !settings.locales.is_empty() {
            settings.locales.clone()
        } else {
            store.discover_locales().map_err(SyncError::Discovery)?
        };

        let mut locales: Vec<String> = Vec::with_capacity(candidates.len());
        for locale in candidates {
            if &locale == reference {
                if !filter.is_empty() {
                    tracing::warn!(locale, "Reference locale cannot be a target, ignoring");
                }
                continue;
            }
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }
        Ok(locales)
    }

    /// Scans source files and lists keys absent from the reference.
    async fn scan_usage(&self, reference: &MessageTree) -> Result<UsageReport, UsageError> {
        let settings = self.config.get_settings();
        let scanner = UsageScanner::new(self.config.workspace_root().to_path_buf(), &settings.usage)?;
        let files = scanner.scan().await;
        Ok(find_undefined(&files, reference, &settings.key_separator))
    }
}
