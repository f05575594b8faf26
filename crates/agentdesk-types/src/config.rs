//! Configuration types for agentdesk.
//!
//! `AppConfig` represents the top-level `config.toml`. Every field has a
//! default so an empty file (or no file at all) yields a runnable server.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chat::AgentDescriptor;
use crate::llm::ProviderKind;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub capture: CaptureConfig,

    /// Adapter definitions, referenced by agents through `endpoint`.
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,

    #[serde(default)]
    pub agents: Vec<AgentDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
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
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Root containing one directory per encoded project path.
    /// `None` resolves to `~/.claude/projects`.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Maximum characters in `lastMessagePreview`.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

fn default_preview_chars() -> usize {
    100
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            root: None,
            preview_chars: default_preview_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleConfig {
    /// Serialize concurrent turns that share a session id.
    #[serde(default = "default_serialize_sessions")]
    pub serialize_sessions: bool,
    /// Forwarded to adapters as the debug flag.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub default_temperature: Option<f64>,
    #[serde(default)]
    pub default_max_tokens: Option<u32>,
}

fn default_serialize_sessions() -> bool {
    true
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            serialize_sessions: default_serialize_sessions(),
            debug: false,
            default_temperature: None,
            default_max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Where capture artifacts are written. `None` uses the system temp dir.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

/// Configuration for one adapter instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Registry key; agents reference it through `endpoint`.
    pub name: String,
    pub kind: ProviderKind,
    /// Executable for `cli_agent` adapters.
    #[serde(default)]
    pub command: Option<String>,
    /// Extra arguments placed before the generated ones.
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL for `openai_compatible` adapters.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub supports_images: Option<bool>,
}
