//! Configuration loader for agentdesk.
//!
//! Reads `config.toml` and deserializes it into [`AppConfig`]. Falls back to
//! defaults when the file is missing or malformed, so a fresh install runs
//! without any configuration.

use std::path::{Path, PathBuf};

use agentdesk_types::config::AppConfig;

/// Application directory name under the platform config and temp dirs.
const APP_DIR: &str = "agentdesk";

/// Load configuration from `path`.
///
/// - If the file does not exist, returns [`AppConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_config(path: &Path) -> AppConfig {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config file at {}, using defaults", path.display());
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

/// Resolve where the config file lives.
///
/// An explicit path (from `--config` or `$AGENTDESK_CONFIG`) wins; otherwise
/// `<config_dir>/agentdesk/config.toml`, or `./config.toml` on platforms
/// without a config dir.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR).join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    })
}

/// Root of the external tool's per-project log tree.
///
/// Defaults to `~/.claude/projects`.
pub fn history_root(config: &AppConfig) -> PathBuf {
    if let Some(root) = &config.history.root {
        return expand_home(root);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".claude")
        .join("projects")
}

/// Directory for capture artifacts. Defaults to `<temp>/agentdesk-captures`.
pub fn capture_dir(config: &AppConfig) -> PathBuf {
    match &config.capture.output_dir {
        Some(dir) => expand_home(dir),
        None => std::env::temp_dir().join(format!("{APP_DIR}-captures")),
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentdesk_types::llm::ProviderKind;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_config_missing_file_returns_default() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).await;
        assert_eq!(config.server.port, 8080);
        assert!(config.providers.is_empty());
    }

    #[tokio::test]
    async fn load_config_valid_toml_returns_parsed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(
            &path,
            r#"
[server]
port = 9090

[history]
root = "/var/logs/projects"
preview_chars = 40

[lifecycle]
serialize_sessions = false

[[providers]]
name = "openai"
kind = "openai_compatible"
model = "gpt-4o-mini"
api_key_env = "OPENAI_API_KEY"
supports_images = true

[[agents]]
id = "writer"
name = "Writer"
endpoint = "openai"
is_orchestrator = true
"#,
        )
        .await
        .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.history.preview_chars, 40);
        assert!(!config.lifecycle.serialize_sessions);
        assert_eq!(config.providers[0].kind, ProviderKind::OpenAiCompatible);
        assert!(config.agents[0].is_orchestrator);
        assert_eq!(history_root(&config), PathBuf::from("/var/logs/projects"));
    }

    #[tokio::test]
    async fn load_config_invalid_toml_returns_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();

        let config = load_config(&path).await;
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn resolve_config_path_prefers_explicit() {
        let explicit = PathBuf::from("/etc/agentdesk.toml");
        assert_eq!(resolve_config_path(Some(explicit.clone())), explicit);
        assert!(resolve_config_path(None).ends_with("config.toml"));
    }

    #[test]
    fn default_dirs() {
        let config = AppConfig::default();
        assert!(history_root(&config).ends_with(".claude/projects"));
        assert!(capture_dir(&config).ends_with("agentdesk-captures"));
    }
}
