//! Translation backends and the batch driver that calls them.

/// Sequential batch driver
mod batch;
/// HTTP backend
mod http;
/// Provider interface
mod provider;
/// Retry and pacing policies
mod retry;

pub use batch::{
    BatchTranslator,
    TranslationRequest,
    TranslationResult,
};
pub use http::HttpTranslator;
pub use provider::{
    TranslationError,
    TranslationProvider,
};
pub use retry::{
    Pacer,
    RetryPolicy,
};
