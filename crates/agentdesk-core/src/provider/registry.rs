//! Provider registry for runtime agent resolution.
//!
//! Adapters are indexed by name; agents reference an adapter through their
//! `endpoint`. The registry is built once at startup and shared read-only
//! behind an `Arc` afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use agentdesk_types::chat::AgentDescriptor;
use agentdesk_types::error::RegistryError;

use super::box_adapter::BoxProviderAdapter;

/// An agent paired with the adapter that serves it.
#[derive(Debug, Clone)]
pub struct ResolvedAgent {
    pub descriptor: AgentDescriptor,
    pub adapter: Arc<BoxProviderAdapter>,
}

/// Registry of adapters and the agents routed to them.
#[derive(Debug, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<BoxProviderAdapter>>,
    agents: Vec<AgentDescriptor>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own name, replacing any previous one.
    pub fn register(&mut self, adapter: BoxProviderAdapter) {
        let name = adapter.name().to_string();
        self.adapters.insert(name, Arc::new(adapter));
    }

    /// Register an agent. An existing agent with the same id is replaced in
    /// place so listing order stays stable.
    pub fn register_agent(&mut self, descriptor: AgentDescriptor) {
        match self.agents.iter_mut().find(|a| a.id == descriptor.id) {
            Some(existing) => *existing = descriptor,
            None => self.agents.push(descriptor),
        }
    }

    /// Remove an agent; returns the removed descriptor.
    pub fn remove_agent(&mut self, agent_id: &str) -> Option<AgentDescriptor> {
        let idx = self.agents.iter().position(|a| a.id == agent_id)?;
        Some(self.agents.remove(idx))
    }

    pub fn agent(&self, agent_id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == agent_id)
    }

    pub fn agents(&self) -> &[AgentDescriptor] {
        &self.agents
    }

    pub fn adapter(&self, name: &str) -> Option<Arc<BoxProviderAdapter>> {
        self.adapters.get(name).cloned()
    }

    pub fn adapter_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Resolve a configured agent to its adapter.
    pub fn resolve_adapter_for(&self, agent_id: &str) -> Result<ResolvedAgent, RegistryError> {
        self.resolve_with_overlay(agent_id, None)
    }

    /// Resolve an agent, letting request-scoped descriptors shadow configured
    /// ones. Overlay descriptors whose endpoint names no registered adapter
    /// are ignored.
    pub fn resolve_with_overlay(
        &self,
        agent_id: &str,
        overlay: Option<&[AgentDescriptor]>,
    ) -> Result<ResolvedAgent, RegistryError> {
        let overlaid = overlay
            .into_iter()
            .flatten()
            .find(|a| a.id == agent_id && self.adapters.contains_key(&a.endpoint));

        let descriptor = overlaid
            .or_else(|| self.agent(agent_id))
            .ok_or_else(|| RegistryError::AgentNotFound(agent_id.to_string()))?;

        self.pair(descriptor)
    }

    /// The designated orchestrator: first orchestrator in the overlay, then
    /// the first configured one.
    pub fn orchestrator(
        &self,
        overlay: Option<&[AgentDescriptor]>,
    ) -> Result<ResolvedAgent, RegistryError> {
        let overlaid = overlay
            .into_iter()
            .flatten()
            .find(|a| a.is_orchestrator && self.adapters.contains_key(&a.endpoint));

        let descriptor = overlaid
            .or_else(|| self.agents.iter().find(|a| a.is_orchestrator))
            .ok_or(RegistryError::NoOrchestrator)?;

        self.pair(descriptor)
    }

    fn pair(&self, descriptor: &AgentDescriptor) -> Result<ResolvedAgent, RegistryError> {
        let adapter = self.adapter(&descriptor.endpoint).ok_or_else(|| {
            RegistryError::AdapterNotFound {
                agent_id: descriptor.id.clone(),
                endpoint: descriptor.endpoint.clone(),
            }
        })?;
        Ok(ResolvedAgent {
            descriptor: descriptor.clone(),
            adapter,
        })
    }
}
