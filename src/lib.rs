//! i18n-catalog-sync
//!
//! Keeps per-locale JSON message catalogs in sync with a reference catalog: detects missing,
//! placeholder and extra keys, fills them through a machine translation backend, and writes
//! the catalogs back with a backup of the previous file.

/// Catalog model, JSON editing and file persistence
pub mod catalog;
/// Settings loading and validation
pub mod config;
/// Drift detection against the reference
pub mod drift;
/// Whole-run orchestration
pub mod driver;
/// Per-locale reconciliation
pub mod engine;
/// Tracing setup
pub mod logging;
/// Run report
pub mod report;
/// Translation backends
pub mod translator;
/// Translation keys used by source code
pub mod usage;

/// Test helpers
mod test_utils;

pub use driver::{
    Driver,
    RunMode,
    RunOptions,
    SyncError,
};
