//! Application configuration types for Parley.
//!
//! `AppConfig` represents the `parley.toml` file. Every field has a default,
//! so an empty or missing file yields a working configuration. Secrets are
//! not part of the file; they are supplied at startup.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Top-level configuration for the Parley server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub turn: TurnConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

/// Transcript store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite URL. `None` means `{data_dir}/parley.db`.
    #[serde(default)]
    pub url: Option<String>,
}

/// Generation backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    /// Model used for replies.
    #[serde(default = "default_model")]
    pub model: String,
    /// Model used by the retrieval gate's classification call.
    #[serde(default = "default_router_model")]
    pub router_model: String,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f64>,
}

fn default_llm_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_router_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            router_model: default_router_model(),
            max_output_tokens: None,
            temperature: None,
        }
    }
}

/// Web search settings for the retrieval gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// When false the gate never searches.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    /// Snippet length cap, in characters.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_search_endpoint() -> String {
    "https://duckduckgo.com/html/".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (compatible)".to_string()
}

fn default_max_results() -> usize {
    5
}

fn default_max_chars() -> usize {
    2000
}

fn default_search_timeout_secs() -> u64 {
    8
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            endpoint: default_search_endpoint(),
            user_agent: default_user_agent(),
            max_results: default_max_results(),
            max_chars: default_max_chars(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Limits applied to a single message turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnConfig {
    /// Number of recent non-empty messages sent as history.
    #[serde(default = "default_history_window")]
    pub history_window: usize,
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,
    #[serde(default = "default_classify_timeout_secs")]
    pub classify_timeout_secs: u64,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
}

fn default_history_window() -> usize {
    6
}

fn default_generation_timeout_secs() -> u64 {
    40
}

fn default_classify_timeout_secs() -> u64 {
    8
}

fn default_store_timeout_secs() -> u64 {
    5
}

impl Default for TurnConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            generation_timeout_secs: default_generation_timeout_secs(),
            classify_timeout_secs: default_classify_timeout_secs(),
            store_timeout_secs: default_store_timeout_secs(),
        }
    }
}

impl TurnConfig {
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }

    pub fn classify_timeout(&self) -> Duration {
        Duration::from_secs(self.classify_timeout_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }
}

/// Account and token settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
    #[serde(default = "default_min_password_len")]
    pub min_password_len: usize,
}

fn default_token_ttl_hours() -> u64 {
    24 * 30
}

fn default_min_password_len() -> usize {
    8
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            min_password_len: default_min_password_len(),
        }
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_default_values() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.llm.model, "gemini-2.5-flash");
        assert_eq!(config.llm.router_model, "gemini-2.5-flash-lite");
        assert_eq!(config.turn.history_window, 6);
        assert_eq!(config.turn.generation_timeout(), Duration::from_secs(40));
        assert_eq!(config.search.max_results, 5);
        assert_eq!(config.search.max_chars, 2000);
        assert!(config.search.enabled);
    }

    #[test]
    fn test_app_config_deserialize_empty() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.turn.store_timeout(), Duration::from_secs(5));
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_app_config_deserialize_partial_sections() {
        let toml_str = r#"
[server]
port = 9000

[turn]
history_window = 10

[search]
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.turn.history_window, 10);
        assert_eq!(config.turn.classify_timeout_secs, 8);
        assert!(!config.search.enabled);
        assert_eq!(config.search.user_agent, "Mozilla/5.0 (compatible)");
    }
}
