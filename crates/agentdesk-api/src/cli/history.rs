//! `agentdesk projects`, `agentdesk histories`, `agentdesk history`.

use anyhow::Result;
use chrono::{DateTime, Utc};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use agentdesk_core::history::project::normalize_project_arg;
use agentdesk_core::history::summary::extract_text;
use agentdesk_types::history::{HistoryListing, MessageRole};

use crate::state::AppState;

pub async fn list_projects(state: &AppState, json: bool) -> Result<()> {
    let projects = state.history.list_projects().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    println!();
    if projects.is_empty() {
        println!("  {} No projects found.", style("i").blue().bold());
    }
    for project in &projects {
        println!("  {}", style(project).cyan());
    }
    println!();
    Ok(())
}

pub async fn list_histories(state: &AppState, project: &str, json: bool) -> Result<()> {
    let project = normalize_project_arg(project);
    let conversations = state.history.list_summaries(&project).await?;

    if json {
        let listing = HistoryListing { conversations };
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if conversations.is_empty() {
        println!();
        println!(
            "  {} No conversations in {}",
            style("i").blue().bold(),
            style(&project).yellow()
        );
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Session").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Started").fg(Color::White),
        Cell::new("Last Active").fg(Color::White),
        Cell::new("Last Message").fg(Color::White),
    ]);

    for summary in &conversations {
        table.add_row(vec![
            Cell::new(&summary.session_id).fg(Color::Cyan),
            Cell::new(summary.message_count),
            Cell::new(summary.start_time.format("%Y-%m-%d %H:%M").to_string()),
            Cell::new(format_relative_time(&summary.last_time)).fg(Color::DarkGrey),
            Cell::new(&summary.last_message_preview),
        ]);
    }

    println!();
    println!("{table}");
    println!();
    println!(
        "  {} conversation{}",
        style(conversations.len()).bold(),
        if conversations.len() == 1 { "" } else { "s" }
    );
    println!();

    Ok(())
}

pub async fn show_history(state: &AppState, project: &str, session: &str, json: bool) -> Result<()> {
    let project = normalize_project_arg(project);
    let conversation = state.history.reconstruct(&project, session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}  {}",
        style("Session").bold(),
        style(&conversation.session_id).cyan(),
        style(&conversation.metadata.project).dim()
    );
    println!();

    for message in &conversation.messages {
        let who = match message.role {
            MessageRole::User => style("you").green().bold(),
            MessageRole::Assistant => style("assistant").magenta().bold(),
            MessageRole::System => style("system").dim(),
        };
        let mut stamp = message.timestamp.format("%H:%M:%S").to_string();
        if message.timestamp_restored {
            stamp.push('~');
        }
        println!("  {} {}", style(stamp).dim(), who);
        for line in extract_text(&message.content).lines() {
            println!("    {line}");
        }
        println!();
    }

    let meta = &conversation.metadata;
    println!(
        "  {}",
        style(format!(
            "{} messages from {} file(s); {} duplicate(s) removed, {} timestamp(s) restored, {} line(s) skipped",
            conversation.messages.len(),
            meta.source_files.len(),
            meta.duplicates_removed,
            meta.timestamps_restored,
            meta.skipped_lines,
        ))
        .dim()
    );
    println!();

    Ok(())
}

fn format_relative_time(dt: &DateTime<Utc>) -> String {
    let diff = Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}
