//! Translation backend trait and its error type.

use async_trait::async_trait;
use thiserror::Error;

/// Why a translation call did not produce text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    /// Connection failure, timeout or an unreadable body.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },

    /// A success status without the expected result field.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Every allowed attempt failed.
    #[error("gave up after {attempts} attempt(s), last error: {last}")]
    Exhausted {
        /// Calls made.
        attempts: u32,
        /// Error of the final call.
        last: Box<TranslationError>,
    },
}

impl TranslationError {
    /// The error of the final attempt, for exhausted retries.
    #[must_use]
    pub fn last_cause(&self) -> &Self {
        match self {
            Self::Exhausted { last, .. } => last.last_cause(),
            other => other,
        }
    }
}

/// A translation backend. Each call is a single attempt; retries and pacing
/// are the caller's concern.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    /// Translates `text` from `source_tag` to `target_tag` with one backend call.
    ///
    /// Empty or whitespace-only `text` is returned unchanged without a backend call.
    ///
    /// # Errors
    /// Returns a [`TranslationError`] when the call fails or the response has no
    /// usable text.
    async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
    ) -> Result<String, TranslationError>;
}
