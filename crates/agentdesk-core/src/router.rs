//! Command router.
//!
//! Inspects raw message text for `@agent` mentions and `@agent verb [target]`
//! structured commands and decides which execution path a turn takes.

use std::sync::LazyLock;

use regex::Regex;

use agentdesk_types::chat::CommandVerb;

static MENTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|\s)@([A-Za-z0-9_-]+)").expect("mention pattern is valid")
});

static COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*@([A-Za-z0-9_-]+)\s+([A-Za-z_-]+)(?:\s+(.+?))?\s*$")
        .expect("command pattern is valid")
});

static ORCHESTRATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(orchestrate|coordinate|collaborate|delegate)\b")
        .expect("orchestration pattern is valid")
});

/// A parsed `@agent verb [target]` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredCommand {
    pub agent_id: String,
    pub verb: CommandVerb,
    pub target: Option<String>,
}

/// Outcome of routing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Send the message to exactly this agent's adapter.
    SingleAgent { agent_id: String },
    /// Short-circuit to a capability handler.
    Capability { command: StructuredCommand },
    /// Hand the raw message to the orchestrator agent.
    Orchestrate { mentions: Vec<String> },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CommandRouter;

impl CommandRouter {
    pub fn new() -> Self {
        Self
    }

    /// Distinct mentioned agent ids, in order of first appearance.
    pub fn parse_mentions(&self, message: &str) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for cap in MENTION.captures_iter(message) {
            let id = &cap[1];
            if !out.iter().any(|m| m == id) {
                out.push(id.to_string());
            }
        }
        out
    }

    /// Parse a structured command. Unknown verbs yield `None`.
    pub fn parse_command(&self, message: &str) -> Option<StructuredCommand> {
        let cap = COMMAND.captures(message)?;
        let verb = cap[2].parse::<CommandVerb>().ok()?;
        Some(StructuredCommand {
            agent_id: cap[1].to_string(),
            verb,
            target: cap.get(3).map(|m| m.as_str().to_string()),
        })
    }

    pub fn has_orchestration_keyword(&self, message: &str) -> bool {
        ORCHESTRATION.is_match(message)
    }

    /// Decide the path for `message`.
    ///
    /// `has_capability` reports whether a handler exists for a verb; commands
    /// without one are routed like ordinary mentions.
    pub fn route(&self, message: &str, has_capability: impl Fn(CommandVerb) -> bool) -> RouteDecision {
        if let Some(command) = self.parse_command(message) {
            if has_capability(command.verb) {
                return RouteDecision::Capability { command };
            }
        }

        let mentions = self.parse_mentions(message);
        if mentions.len() == 1 && !self.has_orchestration_keyword(message) {
            let agent_id = mentions.into_iter().next().unwrap_or_default();
            return RouteDecision::SingleAgent { agent_id };
        }

        RouteDecision::Orchestrate { mentions }
    }
}
