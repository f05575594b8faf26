//! GET /agents

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::state::AppState;

/// An agent as exposed to clients, with its adapter's image capability.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub endpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_context: Option<String>,
    pub is_orchestrator: bool,
    pub supports_images: bool,
}

/// Registered agents in configuration order.
pub fn agent_views(state: &AppState) -> Vec<AgentView> {
    let registry = state.lifecycle.registry();
    registry
        .agents()
        .iter()
        .map(|agent| AgentView {
            id: agent.id.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            endpoint: agent.endpoint.clone(),
            working_context: agent.working_context.clone(),
            is_orchestrator: agent.is_orchestrator,
            supports_images: registry
                .adapter(&agent.endpoint)
                .is_some_and(|adapter| adapter.supports_images()),
        })
        .collect()
}

#[derive(Debug, Serialize)]
pub struct AgentList {
    pub agents: Vec<AgentView>,
}

pub async fn list_agents(State(state): State<AppState>) -> Json<AgentList> {
    Json(AgentList {
        agents: agent_views(&state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_agents_reports_image_support() {
        let tmp = tempfile::TempDir::new().unwrap();
        let state = crate::state::tests::scripted_state("true", tmp.path());
        let Json(list) = list_agents(State(state)).await;
        assert_eq!(list.agents.len(), 1);
        assert_eq!(list.agents[0].id, "coder");
        assert!(list.agents[0].is_orchestrator);
        assert!(!list.agents[0].supports_images);

        let value = serde_json::to_value(&list.agents[0]).unwrap();
        assert_eq!(value["supportsImages"], false);
    }
}
