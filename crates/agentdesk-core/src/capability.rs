//! Capability handlers for structured commands.
//!
//! A capability short-circuits the adapter: the router hands the parsed
//! command to the handler registered for its verb and the lifecycle manager
//! synthesizes a completion describing the produced artifact.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use agentdesk_types::chat::CommandVerb;
use agentdesk_types::error::ChatError;

use crate::router::StructuredCommand;

/// What a capability produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityArtifact {
    /// Human-readable completion text.
    pub description: String,
    pub media_type: Option<String>,
    /// Base64 artifact body, if any.
    pub data: Option<String>,
    /// Where the artifact was written.
    pub path: Option<String>,
}

pub type CapabilityFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CapabilityArtifact, ChatError>> + Send + 'a>>;

/// Handler for one command verb.
pub trait CapabilityHandler: Send + Sync {
    fn verb(&self) -> CommandVerb;

    fn invoke<'a>(&'a self, command: &'a StructuredCommand) -> CapabilityFuture<'a>;
}

/// Verb-indexed handler table.
#[derive(Default, Clone)]
pub struct CapabilityRegistry {
    handlers: HashMap<CommandVerb, Arc<dyn CapabilityHandler>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under its own verb, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn CapabilityHandler>) {
        self.handlers.insert(handler.verb(), handler);
    }

    pub fn get(&self, verb: CommandVerb) -> Option<Arc<dyn CapabilityHandler>> {
        self.handlers.get(&verb).cloned()
    }

    pub fn supports(&self, verb: CommandVerb) -> bool {
        self.handlers.contains_key(&verb)
    }

    pub fn verbs(&self) -> Vec<CommandVerb> {
        CommandVerb::ALL
            .into_iter()
            .filter(|v| self.supports(*v))
            .collect()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("verbs", &self.verbs())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    impl CapabilityHandler for Echo {
        fn verb(&self) -> CommandVerb {
            CommandVerb::ReviewCode
        }

        fn invoke<'a>(&'a self, command: &'a StructuredCommand) -> CapabilityFuture<'a> {
            Box::pin(async move {
                Ok(CapabilityArtifact {
                    description: format!("reviewed {}", command.target.as_deref().unwrap_or("")),
                    media_type: None,
                    data: None,
                    path: None,
                })
            })
        }
    }

    #[tokio::test]
    async fn test_registry_dispatch() {
        let mut reg = CapabilityRegistry::new();
        reg.register(Arc::new(Echo));
        assert!(reg.supports(CommandVerb::ReviewCode));
        assert!(!reg.supports(CommandVerb::CaptureScreen));
        assert_eq!(reg.verbs(), vec![CommandVerb::ReviewCode]);

        let cmd = StructuredCommand {
            agent_id: "impl".to_string(),
            verb: CommandVerb::ReviewCode,
            target: Some("lib.rs".to_string()),
        };
        let handler = reg.get(CommandVerb::ReviewCode).unwrap();
        let artifact = handler.invoke(&cmd).await.unwrap();
        assert_eq!(artifact.description, "reviewed lib.rs");
    }
}
