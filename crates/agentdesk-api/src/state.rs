//! Application state wiring the engines together.
//!
//! AppState holds the lifecycle manager and the history engine used by both
//! the CLI commands and the HTTP handlers, pinned to the concrete infra
//! implementations.

use std::path::PathBuf;
use std::sync::Arc;

use agentdesk_core::capability::CapabilityRegistry;
use agentdesk_core::history::HistoryEngine;
use agentdesk_core::lifecycle::{LifecycleSettings, RequestLifecycleManager};
use agentdesk_infra::capture::ScreenCaptureHandler;
use agentdesk_infra::config::{capture_dir, history_root, load_config, resolve_config_path};
use agentdesk_infra::filesystem::LocalFragmentSource;
use agentdesk_infra::llm::build_registry;
use agentdesk_types::config::AppConfig;
use agentdesk_types::llm::SamplingParams;

/// History engine pinned to the local-disk fragment source.
pub type ConcreteHistoryEngine = HistoryEngine<LocalFragmentSource>;

/// Shared application state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub lifecycle: RequestLifecycleManager,
    pub history: Arc<ConcreteHistoryEngine>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Load configuration and wire services.
    pub async fn init(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let path = resolve_config_path(config_path);
        tracing::debug!(path = %path.display(), "loading configuration");
        let config = load_config(&path).await;
        Ok(Self::from_config(config))
    }

    /// Wire services from an already-loaded configuration.
    pub fn from_config(config: AppConfig) -> Self {
        let registry = build_registry(&config);

        let mut capabilities = CapabilityRegistry::new();
        capabilities.register(Arc::new(ScreenCaptureHandler::new(capture_dir(&config))));

        let settings = LifecycleSettings {
            sampling: SamplingParams {
                model: None,
                temperature: config.lifecycle.default_temperature,
                max_tokens: config.lifecycle.default_max_tokens,
            },
            debug: config.lifecycle.debug,
            serialize_sessions: config.lifecycle.serialize_sessions,
        };
        let lifecycle =
            RequestLifecycleManager::new(Arc::new(registry), Arc::new(capabilities), settings);

        let root = history_root(&config);
        tracing::debug!(root = %root.display(), "history root");
        let history = Arc::new(HistoryEngine::new(
            LocalFragmentSource::new(root),
            config.history.preview_chars,
        ));

        Self {
            lifecycle,
            history,
            config: Arc::new(config),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use agentdesk_types::chat::AgentDescriptor;
    use agentdesk_types::config::ProviderConfig;
    use agentdesk_types::llm::ProviderKind;

    /// State whose single `sh`-scripted agent runs `script` per turn and
    /// whose history root is `history_root`.
    pub(crate) fn scripted_state(script: &str, history_root: &std::path::Path) -> AppState {
        let mut config = AppConfig::default();
        config.history.root = Some(history_root.to_path_buf());
        config.capture.output_dir = Some(history_root.join("captures"));
        config.providers = vec![ProviderConfig {
            name: "scripted".to_string(),
            kind: ProviderKind::CliAgent,
            command: Some("sh".to_string()),
            args: vec!["-c".to_string(), script.to_string(), "agent".to_string()],
            model: None,
            base_url: None,
            api_key_env: None,
            supports_images: None,
        }];
        config.agents = vec![AgentDescriptor {
            id: "coder".to_string(),
            name: "Coder".to_string(),
            description: "scripted test agent".to_string(),
            working_context: None,
            endpoint: "scripted".to_string(),
            is_orchestrator: true,
        }];
        AppState::from_config(config)
    }

    #[test]
    fn test_from_config_wires_capture_and_agents() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = scripted_state("true", tmp.path());
        assert_eq!(state.lifecycle.registry().agents().len(), 1);
        assert!(state
            .lifecycle
            .capabilities()
            .supports(agentdesk_types::chat::CommandVerb::CaptureScreen));
        assert_eq!(state.history.preview_chars(), 100);
    }
}
