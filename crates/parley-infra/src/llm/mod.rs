//! Generation backend implementations.
//!
//! Contains the Gemini implementation of the [`LlmProvider`] trait defined
//! in `parley-core`, and a factory ([`create_provider`]) that builds it from
//! configuration.
//!
//! [`LlmProvider`]: parley_core::llm::provider::LlmProvider

pub mod gemini;

use secrecy::SecretString;

use parley_core::llm::box_provider::BoxLlmProvider;
use parley_types::config::LlmConfig;
use parley_types::llm::LlmError;

use self::gemini::GeminiProvider;

/// Create a [`BoxLlmProvider`] from configuration and an optional API key.
///
/// A missing key is not an error here: the provider is built anyway and
/// reports [`LlmError::NotConfigured`] from each call, so the server can
/// start and surface the problem per turn.
pub fn create_provider(
    config: &LlmConfig,
    api_key: Option<SecretString>,
) -> Result<BoxLlmProvider, LlmError> {
    if api_key.is_none() {
        tracing::warn!("No generation API key configured; replies will fail until one is set");
    }
    let provider = GeminiProvider::new(api_key, config.base_url.clone())?;
    Ok(BoxLlmProvider::new(provider))
}
