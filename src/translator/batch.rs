//! Sequential, paced, retried translation of drifted entries.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::provider::{
    TranslationError,
    TranslationProvider,
};
use super::retry::{
    Pacer,
    RetryPolicy,
};
use crate::catalog::DotPath;

/// One entry to translate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    /// Catalog path the translation is written to.
    pub path: DotPath,
    /// Reference text.
    pub text: String,
}

/// Outcome for one entry; consumed by the merge step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    /// Catalog path of the entry.
    pub path: DotPath,
    /// Reference text that was sent.
    pub source_text: String,
    /// Translated text, or the error of the last attempt wrapped in `Exhausted`.
    pub outcome: Result<String, TranslationError>,
    /// Backend calls made; zero for short-circuited input.
    pub attempts: u32,
}

impl TranslationResult {
    /// The translation, if any attempt succeeded.
    #[must_use]
    pub fn translated_text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    /// Translation that differs from the source text.
    #[must_use]
    pub fn changed_text(&self) -> Option<&str> {
        self.translated_text().filter(|text| *text != self.source_text)
    }
}

/// Drives one locale's translations through a provider, one call at a time.
pub struct BatchTranslator {
    /// Backend making single attempts.
    provider: Arc<dyn TranslationProvider>,
    /// Attempt bound and backoff.
    retry: RetryPolicy,
    /// Minimum spacing of backend calls.
    pacer: Pacer,
    /// Language tag of the reference locale.
    source_tag: String,
    /// Language tag of the locale being filled.
    target_tag: String,
}

impl fmt::Debug for BatchTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchTranslator")
            .field("retry", &self.retry)
            .field("source_tag", &self.source_tag)
            .field("target_tag", &self.target_tag)
            .finish_non_exhaustive()
    }
}

impl BatchTranslator {
    /// Translator from `source_tag` to `target_tag` calling `provider` at most once per
    /// `pacing_interval`.
    #[must_use]
    pub fn new(
        provider: Arc<dyn TranslationProvider>,
        retry: RetryPolicy,
        pacing_interval: Duration,
        source_tag: impl Into<String>,
        target_tag: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            retry,
            pacer: Pacer::new(pacing_interval),
            source_tag: source_tag.into(),
            target_tag: target_tag.into(),
        }
    }

    /// Translates every request in order. Never fails as a whole; per-entry errors
    /// are carried in each result.
    pub async fn translate_all(&mut self, requests: Vec<TranslationRequest>) -> Vec<TranslationResult> {
        let total = requests.len();
        let mut results = Vec::with_capacity(total);
        for (index, request) in requests.into_iter().enumerate() {
            tracing::debug!(
                target_tag = %self.target_tag,
                path = %request.path,
                "Translating {}/{}",
                index + 1,
                total
            );
            results.push(self.translate_one(request).await);
        }
        results
    }

    /// Translates one entry, retrying failed calls with backoff up to the attempt limit.
    ///
    /// Empty or whitespace-only text is returned as is without calling the backend.
    pub async fn translate_one(&mut self, request: TranslationRequest) -> TranslationResult {
        let TranslationRequest { path, text } = request;

        if text.trim().is_empty() {
            return TranslationResult { path, outcome: Ok(text.clone()), source_text: text, attempts: 0 };
        }

        let max_attempts = self.retry.max_attempts();
        let mut attempts = 0;
        let outcome = loop {
            attempts += 1;
            self.pacer.wait().await;

            match self.provider.translate(&text, &self.source_tag, &self.target_tag).await {
                Ok(translated) => break Ok(translated),
                Err(e) if attempts < max_attempts => {
                    let delay = self.retry.delay_after(attempts);
                    tracing::warn!(
                        %path,
                        attempt = attempts,
                        max_attempts,
                        error = %e,
                        "Translation failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(%path, attempts, error = %e, "Translation failed, giving up");
                    break Err(TranslationError::Exhausted { attempts, last: Box::new(e) });
                }
            }
        };

        TranslationResult { path, source_text: text, outcome, attempts }
    }
}
