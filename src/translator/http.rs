//! HTTP translation backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{
    Deserialize,
    Serialize,
};

use super::provider::{
    TranslationError,
    TranslationProvider,
};
use crate::config::{
    TranslatorApi,
    TranslatorConfig,
};

/// Request body of the `space` API.
#[derive(Serialize)]
struct SpaceRequest<'a> {
    /// Text to translate.
    text: &'a str,
    /// Source language tag.
    source: &'a str,
    /// Target language tag.
    target: &'a str,
}

/// Response body of the `space` API.
#[derive(Deserialize)]
struct SpaceResponse {
    /// Translated text.
    #[serde(alias = "translated_text", alias = "translation")]
    result: Option<String>,
}

/// Request body of the `inference` API.
#[derive(Serialize)]
struct InferenceRequest<'a> {
    /// Text to translate.
    inputs: &'a str,
    /// Language pair.
    parameters: InferenceParameters<'a>,
}

/// Language pair of an `inference` request.
#[derive(Serialize)]
struct InferenceParameters<'a> {
    /// Source language tag.
    src_lang: &'a str,
    /// Target language tag.
    tgt_lang: &'a str,
}

/// One element of the `inference` response list.
#[derive(Deserialize)]
struct InferenceItem {
    /// Translated text.
    translation_text: Option<String>,
}

/// Calls a translation endpoint over HTTP. The client (and its connection pool) is
/// shared by every call.
#[derive(Debug, Clone)]
pub struct HttpTranslator {
    /// Client with timeout and user agent applied.
    client: reqwest::Client,
    /// URL every request is posted to.
    endpoint: String,
    /// Wire flavour.
    api: TranslatorApi,
    /// Bearer token, sent when present.
    token: Option<String>,
}

impl HttpTranslator {
    /// Reads the bearer token from `config.token_env` for the inference API.
    ///
    /// # Errors
    /// Returns [`TranslationError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &TranslatorConfig) -> Result<Self, TranslationError> {
        let token = match config.api {
            TranslatorApi::Inference => {
                let token = std::env::var(&config.token_env).ok().filter(|t| !t.is_empty());
                if token.is_none() {
                    tracing::warn!(
                        env = %config.token_env,
                        "No API token set, sending unauthenticated requests"
                    );
                }
                token
            }
            TranslatorApi::Space => None,
        };
        Self::with_token(config, token)
    }

    /// Translator using `token` as is instead of reading it from the environment.
    ///
    /// # Errors
    /// Returns [`TranslationError::Transport`] if the HTTP client cannot be built.
    pub fn with_token(
        config: &TranslatorConfig,
        token: Option<String>,
    ) -> Result<Self, TranslationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TranslationError::Transport(format!("failed to create client: {e}")))?;

        Ok(Self { client, endpoint: config.endpoint.clone(), api: config.api, token })
    }

    /// Posts `body` as JSON and returns the response text of a success status.
    async fn post<B: Serialize + Sync>(&self, body: &B) -> Result<String, TranslationError> {
        let mut request = self.client.post(&self.endpoint).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TranslationError::Transport(format!("request failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| TranslationError::Transport(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            return Err(TranslationError::Status { status: status.as_u16(), body: text });
        }
        Ok(text)
    }
}

#[async_trait]
impl TranslationProvider for HttpTranslator {
    async fn translate(
        &self,
        text: &str,
        source_tag: &str,
        target_tag: &str,
    ) -> Result<String, TranslationError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let translated = match self.api {
            TranslatorApi::Space => {
                let body = self
                    .post(&SpaceRequest { text, source: source_tag, target: target_tag })
                    .await?;
                serde_json::from_str::<SpaceResponse>(&body)
                    .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?
                    .result
            }
            TranslatorApi::Inference => {
                let body = self
                    .post(&InferenceRequest {
                        inputs: text,
                        parameters: InferenceParameters { src_lang: source_tag, tgt_lang: target_tag },
                    })
                    .await?;
                serde_json::from_str::<Vec<InferenceItem>>(&body)
                    .map_err(|e| TranslationError::MalformedResponse(e.to_string()))?
                    .into_iter()
                    .next()
                    .and_then(|item| item.translation_text)
            }
        };

        match translated.map(|t| t.trim().to_string()) {
            Some(t) if !t.is_empty() => Ok(t),
            Some(_) => Err(TranslationError::MalformedResponse("empty translation".to_string())),
            None => Err(TranslationError::MalformedResponse("missing result field".to_string())),
        }
    }
}
