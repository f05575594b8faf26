//! `agentdesk agents`

use anyhow::Result;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use crate::http::handlers::agents::agent_views;
use crate::state::AppState;

pub async fn list_agents(state: &AppState, json: bool) -> Result<()> {
    let agents = agent_views(state);

    if json {
        println!("{}", serde_json::to_string_pretty(&agents)?);
        return Ok(());
    }

    if agents.is_empty() {
        println!();
        println!(
            "  {} No agents configured. Add [[agents]] entries to {}",
            style("i").blue().bold(),
            style("config.toml").yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Id").fg(Color::White),
        Cell::new("Name").fg(Color::White),
        Cell::new("Endpoint").fg(Color::White),
        Cell::new("Images").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Description").fg(Color::White),
    ]);

    for agent in &agents {
        let id = if agent.is_orchestrator {
            format!("{} ★", agent.id)
        } else {
            agent.id.clone()
        };
        let images = if agent.supports_images {
            Cell::new("yes").fg(Color::Green)
        } else {
            Cell::new("no").fg(Color::DarkGrey)
        };
        let status = match state.lifecycle.registry().adapter(&agent.endpoint) {
            Some(adapter) => match adapter.check_available().await {
                Ok(()) => Cell::new("● ready").fg(Color::Green),
                Err(e) => {
                    tracing::debug!(agent_id = %agent.id, error = %e, "adapter availability check failed");
                    Cell::new("○ unavailable").fg(Color::Yellow)
                }
            },
            None => Cell::new("◌ no adapter").fg(Color::DarkGrey),
        };
        table.add_row(vec![
            Cell::new(id).fg(Color::Cyan),
            Cell::new(&agent.name),
            Cell::new(&agent.endpoint),
            images,
            status,
            Cell::new(&agent.description).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} agent{}  ({} orchestrator)",
        style(agents.len()).bold(),
        if agents.len() == 1 { "" } else { "s" },
        style("★").yellow()
    );
    println!();

    Ok(())
}
