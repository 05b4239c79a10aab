use std::collections::BTreeMap;

use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;

/// One rejected settings field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error in '{field_path}': {message}")]
pub struct ValidationError {
    /// JSON path to the field (e.g., "usage.includePatterns[0]")
    pub field_path: String,
    /// What is wrong with it.
    pub message: String,
}

impl ValidationError {
    /// Creates a validation error for `field_path`.
    #[must_use]
    pub fn new(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field_path: field_path.into(), message: message.into() }
    }
}

/// Settings could not be loaded or are invalid.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// One or more fields are invalid.
    #[error("Configuration validation failed:\n{}", format_validation_errors(.0))]
    ValidationErrors(Vec<ValidationError>),

    /// The settings file could not be read.
    #[error("Failed to load configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// The settings file is not valid JSON for the schema.
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Numbered list, one error per line.
fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .enumerate()
        .map(|(i, err)| format!("  {}. {} - {}", i + 1, err.field_path, err.message))
        .collect::<Vec<_>>()
        .join("\n")
}

/// What to do when the backend returns the source text unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IdenticalTranslationPolicy {
    /// Write it and flag it as possibly untranslated.
    #[default]
    Accept,
    /// Leave the entry as it was so it is picked up again next run.
    Skip,
}

/// Wire format spoken by the translation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TranslatorApi {
    /// `{text, source, target}` → `{result}`
    #[default]
    Space,
    /// `{inputs, parameters: {src_lang, tgt_lang}}` → `[{translation_text}]`, bearer token
    Inference,
}

/// Workspace settings read from `.i18n-sync.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SyncSettings {
    /// Catalog directory, relative to the workspace root.
    pub messages_dir: String,
    /// Locale every other catalog is compared against.
    pub reference_locale: String,
    /// Locales to reconcile, in processing order. Empty means every catalog found.
    pub locales: Vec<String>,
    /// Joins key segments in reports and source-code keys.
    pub key_separator: String,
    /// Appended to `<locale>.json` for the pre-run copy.
    pub backup_suffix: String,

    /// Locale code → backend language tag.
    pub language_tags: BTreeMap<String, String>,
    /// Locale code → "needs translation" marker substrings.
    pub placeholder_markers: BTreeMap<String, Vec<String>>,
    /// Markers for locales without an entry in `placeholder_markers`.
    pub default_markers: Vec<String>,

    /// Handling of results equal to their source text.
    pub identical_translation: IdenticalTranslationPolicy,
    /// Fill a missing key with the reference text when its translation fails.
    pub fill_missing_on_failure: bool,

    /// Translation backend.
    pub translator: TranslatorConfig,
    /// Source-code key usage scan.
    pub usage: UsageConfig,
}

/// HTTP translation backend and its retry and pacing limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TranslatorConfig {
    /// URL every request is POSTed to.
    pub endpoint: String,
    /// Request and response format.
    pub api: TranslatorApi,
    /// Overrides the tag looked up for the reference locale.
    pub source_lang_tag: Option<String>,
    /// Environment variable holding the bearer token for `inference`.
    pub token_env: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Calls per key before giving up, first attempt included.
    pub max_attempts: u32,
    /// First retry delay; doubles on each further attempt.
    pub base_delay_ms: u64,
    /// Minimum interval between two backend calls.
    pub pacing_interval_ms: u64,
    /// `User-Agent` header value.
    pub user_agent: String,
}

/// Which source files are scanned and which calls count as key usage.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UsageConfig {
    /// Run the scan at all.
    pub enabled: bool,
    /// Globs relative to the workspace root.
    pub include_patterns: Vec<String>,
    /// Globs removed from the include set; matching directories are not entered.
    pub exclude_patterns: Vec<String>,
    /// Functions whose first string argument is a translation key.
    pub key_functions: Vec<String>,
    /// Functions whose first string argument is a namespace for the file.
    pub namespace_functions: Vec<String>,
}

impl SyncSettings {
    /// # Errors
    /// - Required field is empty
    /// - Invalid glob pattern or endpoint URL
    /// - Reference locale without a language tag
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.key_separator.is_empty() {
            errors.push(ValidationError::new(
                "keySeparator",
                "The separator cannot be empty. Please specify a separator, for example: \".\" (dot)",
            ));
        }

        if self.messages_dir.is_empty() {
            errors.push(ValidationError::new(
                "messagesDir",
                "The directory cannot be empty. Example: \"messages\"",
            ));
        }

        if self.reference_locale.is_empty() {
            errors.push(ValidationError::new(
                "referenceLocale",
                "The reference locale cannot be empty. Example: \"en\"",
            ));
        } else if self.translator.source_lang_tag.is_none()
            && !self.language_tags.contains_key(&self.reference_locale)
        {
            errors.push(ValidationError::new(
                "languageTags",
                format!(
                    "No language tag for reference locale '{}'. Add it here or set translator.sourceLangTag",
                    self.reference_locale
                ),
            ));
        }

        if let Some(index) = self.locales.iter().position(|l| l == &self.reference_locale) {
            errors.push(ValidationError::new(
                format!("locales[{index}]"),
                "The reference locale cannot be reconciled against itself",
            ));
        }

        for (locale, markers) in &self.placeholder_markers {
            if markers.is_empty() || markers.iter().any(String::is_empty) {
                errors.push(ValidationError::new(
                    format!("placeholderMarkers.{locale}"),
                    "Markers must be a non-empty list of non-empty strings",
                ));
            }
        }

        if self.default_markers.iter().any(String::is_empty) {
            errors.push(ValidationError::new("defaultMarkers", "Markers cannot be empty strings"));
        }

        if self.translator.max_attempts == 0 {
            errors.push(ValidationError::new(
                "translator.maxAttempts",
                "At least one attempt is required",
            ));
        }

        if let Err(e) = reqwest::Url::parse(&self.translator.endpoint) {
            errors.push(ValidationError::new(
                "translator.endpoint",
                format!("Invalid URL '{}': {e}", self.translator.endpoint),
            ));
        }

        for (index, pattern) in self.usage.include_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("usage.includePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        for (index, pattern) in self.usage.exclude_patterns.iter().enumerate() {
            if let Err(e) = globset::Glob::new(pattern) {
                errors.push(ValidationError::new(
                    format!("usage.excludePatterns[{index}]"),
                    format!("Invalid glob pattern '{pattern}': {e}"),
                ));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// NLLB tags for the locales the catalogs usually carry.
fn default_language_tags() -> BTreeMap<String, String> {
    [
        ("en", "eng_Latn"),
        ("zh", "zho_Hans"),
        ("ar", "arb_Arab"),
        ("hi", "hin_Deva"),
        ("ht", "hat_Latn"),
        ("es", "spa_Latn"),
        ("fr", "fra_Latn"),
        ("lo", "lao_Laoo"),
        ("my", "mya_Mymr"),
        ("pt", "por_Latn"),
        ("sw", "swh_Latn"),
        ("te", "tel_Telu"),
        ("si", "sin_Sinh"),
        ("am", "amh_Ethi"),
        ("km", "khm_Khmr"),
        ("ne", "npi_Deva"),
        ("mg", "plt_Latn"),
    ]
    .into_iter()
    .map(|(locale, tag)| (locale.to_string(), tag.to_string()))
    .collect()
}

/// Markers left by earlier manual and scripted catalog fills.
fn default_placeholder_markers() -> BTreeMap<String, Vec<String>> {
    [("zh", "待翻译"), ("ar", "يحتاج ترجمة"), ("hi", "अनुवाद की आवश्यकता"), ("ht", "Gen pou tradwi")]
        .into_iter()
        .map(|(locale, marker)| (locale.to_string(), vec![marker.to_string()]))
        .collect()
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            messages_dir: "messages".to_string(),
            reference_locale: "en".to_string(),
            locales: Vec::new(),
            key_separator: ".".to_string(),
            backup_suffix: ".backup".to_string(),
            language_tags: default_language_tags(),
            placeholder_markers: default_placeholder_markers(),
            default_markers: vec!["待翻译".to_string()],
            identical_translation: IdenticalTranslationPolicy::default(),
            fill_missing_on_failure: true,
            translator: TranslatorConfig::default(),
            usage: UsageConfig::default(),
        }
    }
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://wane0528-my-nllb-api.hf.space/api/v4/translator".to_string(),
            api: TranslatorApi::default(),
            source_lang_tag: None,
            token_env: "HUGGINGFACE_API_TOKEN".to_string(),
            timeout_secs: 30,
            max_attempts: 3,
            base_delay_ms: 1000,
            pacing_interval_ms: 500,
            user_agent: concat!("i18n-catalog-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            include_patterns: vec![
                "components/**/*.{ts,tsx}".to_string(),
                "app/**/*.{ts,tsx}".to_string(),
                "lib/**/*.{ts,tsx}".to_string(),
            ],
            exclude_patterns: vec!["node_modules/**".to_string()],
            key_functions: ["t", "tNav", "tLayout", "tCommon"].map(String::from).to_vec(),
            namespace_functions: ["useTranslations", "getTranslations"].map(String::from).to_vec(),
        }
    }
}
