//! GeminiProvider -- concrete [`LlmProvider`] implementation for the Gemini
//! `generateContent` REST API.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building request headers. A provider built without a key still
//! works as a value: every call fails with [`LlmError::NotConfigured`].

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use parley_core::llm::provider::{LlmProvider, LlmStream};
use parley_types::llm::{CompletionRequest, CompletionResponse, LlmError, StreamEvent, Usage};

use super::streaming::create_gemini_stream;
use super::types::{GeminiErrorEnvelope, GeminiRequest, GeminiResponse};

/// Gemini generation backend.
///
/// No request-level timeout is set on the HTTP client; callers bound each
/// call with their own deadline.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: Option<SecretString>, base_url: impl Into<String>) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
        })
    }

    /// `{base}/models/{model}:{method}`
    fn url(&self, model: &str, method: &str) -> String {
        format!(
            "{}/models/{}:{}",
            self.base_url.trim_end_matches('/'),
            model,
            method
        )
    }
}

/// Map a non-2xx status and its body to an [`LlmError`].
pub fn map_error_status(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|env| env.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        401 | 403 => LlmError::AuthenticationFailed,
        429 => LlmError::RateLimited {
            retry_after_ms: None,
        },
        503 => LlmError::Overloaded(message),
        400 => LlmError::InvalidRequest(message),
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

impl LlmProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let api_key = self.api_key.as_ref().ok_or(LlmError::NotConfigured)?;
        let body = GeminiRequest::from(request);
        let url = self.url(&request.model, "generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(map_error_status(status.as_u16(), &error_body));
        }

        let gemini_resp: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        Ok(CompletionResponse {
            content: gemini_resp.text(),
            model: gemini_resp
                .model_version
                .clone()
                .unwrap_or_else(|| request.model.clone()),
            stop_reason: gemini_resp.stop_reason(),
            usage: gemini_resp
                .usage_metadata
                .map(Usage::from)
                .unwrap_or_default(),
        })
    }

    fn stream(&self, request: CompletionRequest) -> LlmStream {
        let Some(api_key) = self.api_key.as_ref() else {
            return Box::pin(futures_util::stream::once(async {
                Err::<StreamEvent, _>(LlmError::NotConfigured)
            }));
        };
        let body = GeminiRequest::from(&request);
        let url = format!("{}?alt=sse", self.url(&request.model, "streamGenerateContent"));

        create_gemini_stream(&self.client, url, body, api_key)
    }
}
