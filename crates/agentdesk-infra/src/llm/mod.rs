//! Provider adapter implementations.
//!
//! Contains the concrete [`ProviderAdapter`] implementations defined against
//! `agentdesk-core`: the CLI subprocess adapter and the OpenAI-compatible
//! streaming adapter.
//!
//! Also provides the adapter factory ([`create_adapter`]) that constructs the
//! right adapter from a [`ProviderConfig`], and [`build_registry`], which
//! assembles a [`ProviderRegistry`] from the whole [`AppConfig`].
//!
//! [`ProviderAdapter`]: agentdesk_core::provider::adapter::ProviderAdapter

pub mod cli_agent;
pub mod openai_compat;

use secrecy::SecretString;

use agentdesk_core::provider::box_adapter::BoxProviderAdapter;
use agentdesk_core::provider::registry::ProviderRegistry;
use agentdesk_types::chat::AgentDescriptor;
use agentdesk_types::config::{AppConfig, ProviderConfig};
use agentdesk_types::llm::{AdapterError, ProviderKind};

use self::cli_agent::CliAgentAdapter;
use self::openai_compat::{DEFAULT_BASE_URL, OpenAiCompatAdapter};

/// Executable used by `cli_agent` providers without a `command`.
pub const DEFAULT_CLI_COMMAND: &str = "claude";

/// Create a [`BoxProviderAdapter`] from a [`ProviderConfig`], reading API keys
/// from the process environment.
pub fn create_adapter(config: &ProviderConfig) -> Result<BoxProviderAdapter, AdapterError> {
    create_adapter_with_env(config, |key| std::env::var(key).ok())
}

/// Create an adapter, resolving `api_key_env` through `lookup`.
///
/// # Errors
///
/// Returns [`AdapterError::Configuration`] when an `openai_compatible`
/// provider has no model, or names an API-key variable that is not set.
pub fn create_adapter_with_env(
    config: &ProviderConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<BoxProviderAdapter, AdapterError> {
    match config.kind {
        ProviderKind::CliAgent => {
            let command = config
                .command
                .clone()
                .unwrap_or_else(|| DEFAULT_CLI_COMMAND.to_string());
            let adapter = CliAgentAdapter::new(
                config.name.clone(),
                command,
                config.args.clone(),
                config.model.clone(),
            );
            if config.supports_images == Some(true) {
                tracing::warn!(
                    provider = %config.name,
                    "supports_images is ignored for cli_agent providers"
                );
            }
            Ok(BoxProviderAdapter::new(adapter))
        }
        ProviderKind::OpenAiCompatible => {
            let model = config.model.clone().ok_or_else(|| {
                AdapterError::Configuration(format!("provider '{}' has no model", config.name))
            })?;
            let api_key = match config.api_key_env.as_deref() {
                Some(var) => {
                    let value = lookup(var).filter(|v| !v.is_empty()).ok_or_else(|| {
                        AdapterError::Configuration(format!(
                            "provider '{}': environment variable {var} is not set",
                            config.name
                        ))
                    })?;
                    Some(SecretString::from(value))
                }
                None => None,
            };
            let adapter = OpenAiCompatAdapter::new(
                config.name.clone(),
                config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model,
                api_key,
                config.supports_images.unwrap_or(false),
            )?;
            Ok(BoxProviderAdapter::new(adapter))
        }
    }
}

/// Provider used when the configuration declares none.
fn default_provider() -> ProviderConfig {
    ProviderConfig {
        name: DEFAULT_CLI_COMMAND.to_string(),
        kind: ProviderKind::CliAgent,
        command: None,
        args: Vec::new(),
        model: None,
        base_url: None,
        api_key_env: None,
        supports_images: None,
    }
}

/// Build the registry described by `config`.
///
/// Providers that fail to construct are skipped with a warning, and so are
/// agents whose endpoint names no registered adapter. With no providers
/// configured a single `claude` CLI provider is used; with no agents, one
/// agent per adapter is derived and the first of them orchestrates.
pub fn build_registry(config: &AppConfig) -> ProviderRegistry {
    build_registry_with_env(config, |key| std::env::var(key).ok())
}

pub fn build_registry_with_env(
    config: &AppConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> ProviderRegistry {
    let providers = if config.providers.is_empty() {
        vec![default_provider()]
    } else {
        config.providers.clone()
    };

    let mut registry = ProviderRegistry::new();
    for provider in &providers {
        match create_adapter_with_env(provider, &lookup) {
            Ok(adapter) => {
                tracing::debug!(provider = %provider.name, kind = %provider.kind, "registered adapter");
                registry.register(adapter);
            }
            Err(e) => {
                tracing::warn!(provider = %provider.name, error = %e, "skipping provider");
            }
        }
    }

    let agents: Vec<AgentDescriptor> = if config.agents.is_empty() {
        registry
            .adapter_names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| AgentDescriptor {
                id: name.to_string(),
                name: name.to_string(),
                description: String::new(),
                working_context: None,
                endpoint: name.to_string(),
                is_orchestrator: i == 0,
            })
            .collect()
    } else {
        config.agents.clone()
    };

    for agent in agents {
        if registry.adapter(&agent.endpoint).is_none() {
            tracing::warn!(
                agent_id = %agent.id,
                endpoint = %agent.endpoint,
                "skipping agent with unknown endpoint"
            );
            continue;
        }
        registry.register_agent(agent);
    }

    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    fn openai_provider(api_key_env: Option<&str>) -> ProviderConfig {
        ProviderConfig {
            name: "openai".to_string(),
            kind: ProviderKind::OpenAiCompatible,
            command: None,
            args: Vec::new(),
            model: Some("gpt-4o-mini".to_string()),
            base_url: None,
            api_key_env: api_key_env.map(str::to_string),
            supports_images: Some(true),
        }
    }

    fn agent(id: &str, endpoint: &str) -> AgentDescriptor {
        AgentDescriptor {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            working_context: None,
            endpoint: endpoint.to_string(),
            is_orchestrator: false,
        }
    }

    #[test]
    fn test_create_cli_adapter_negates_images() {
        let mut config = default_provider();
        config.supports_images = Some(true);
        let adapter = create_adapter_with_env(&config, |_| None).unwrap();
        assert_eq!(adapter.name(), "claude");
        assert!(!adapter.supports_images());
    }

    #[test]
    fn test_create_openai_adapter_reads_env() {
        let config = openai_provider(Some("AGENTDESK_TEST_KEY"));
        let adapter = create_adapter_with_env(&config, |key| {
            (key == "AGENTDESK_TEST_KEY").then(|| "sk-test".to_string())
        })
        .unwrap();
        assert_eq!(adapter.name(), "openai");
        assert!(adapter.supports_images());
    }

    #[test]
    fn test_missing_api_key_env_is_configuration_error() {
        let config = openai_provider(Some("AGENTDESK_UNSET_KEY"));
        let err = create_adapter_with_env(&config, |_| None).unwrap_err();
        assert!(matches!(err, AdapterError::Configuration(ref m) if m.contains("AGENTDESK_UNSET_KEY")));
    }

    #[test]
    fn test_openai_without_model_is_configuration_error() {
        let mut config = openai_provider(None);
        config.model = None;
        assert!(matches!(
            create_adapter_with_env(&config, |_| None),
            Err(AdapterError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_registry_defaults() {
        let registry = build_registry_with_env(&AppConfig::default(), |_| None);
        assert_eq!(registry.adapter_names(), vec!["claude"]);
        assert_eq!(registry.agents().len(), 1);
        assert_eq!(registry.agents()[0].endpoint, "claude");
        assert!(registry.orchestrator(None).is_ok());
    }

    #[test]
    fn test_build_registry_skips_broken_providers_and_orphan_agents() {
        let config = AppConfig {
            providers: vec![default_provider(), openai_provider(Some("AGENTDESK_UNSET_KEY"))],
            agents: vec![agent("coder", "claude"), agent("writer", "openai")],
            ..Default::default()
        };
        let registry = build_registry_with_env(&config, |_| None);
        assert_eq!(registry.adapter_names(), vec!["claude"]);
        assert!(registry.agent("coder").is_some());
        assert!(registry.agent("writer").is_none());
        assert!(registry.resolve_adapter_for("coder").is_ok());
    }
}
