//! Settings, validation and the lookup tables derived from them.
/// Config file loader
mod loader;
/// Configuration manager
mod manager;
/// Source file pattern matcher
mod matcher;
/// Language tag and marker tables
mod tables;
/// Configuration types and settings
mod types;

pub use loader::CONFIG_FILE_NAME;
pub use manager::ConfigManager;
pub use matcher::{
    MatcherError,
    SourceMatcher,
};
pub use tables::{
    LanguageTagTable,
    MarkerTable,
};
pub use types::{
    ConfigError,
    IdenticalTranslationPolicy,
    SyncSettings,
    TranslatorApi,
    TranslatorConfig,
    UsageConfig,
    ValidationError,
};
