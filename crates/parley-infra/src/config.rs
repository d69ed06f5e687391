//! Configuration loader for Parley.
//!
//! Reads `parley.toml` (by default from the data directory, `~/.parley/`)
//! and deserializes it into [`AppConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::{Path, PathBuf};

use parley_types::config::AppConfig;

/// Data directory from `PARLEY_DATA_DIR`, falling back to `~/.parley`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PARLEY_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parley")
}

/// `{data_dir}/parley.toml`.
pub fn default_config_path() -> PathBuf {
    resolve_data_dir().join("parley.toml")
}

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config, with defaults for omitted fields.
pub async fn load_app_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", path.display());
            return AppConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", path.display());
            return AppConfig::default();
        }
    };

    match toml::from_str::<AppConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!("Failed to parse {}: {err}, using defaults", path.display());
            AppConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_app_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_app_config(&tmp.path().join("parley.toml")).await;
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.search.max_results, 5);
    }

    #[tokio::test]
    async fn load_app_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("parley.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9000

[llm]
model = "gemini-2.5-pro"

[search]
enabled = false
"#,
        )
        .await
        .unwrap();

        let config = load_app_config(&path).await;
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gemini-2.5-pro");
        assert!(!config.search.enabled);
        assert_eq!(config.turn.history_window, 6);
    }

    #[tokio::test]
    async fn load_app_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("parley.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_app_config(&path).await;
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn default_config_path_is_in_data_dir() {
        let path = default_config_path();
        assert!(path.ends_with("parley.toml"));
        assert_eq!(path.parent().unwrap(), resolve_data_dir());
    }
}
