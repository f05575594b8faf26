//! CLI command definitions for the `agentdesk` binary.
//!
//! `serve` runs the HTTP surface; the remaining commands are read-only views
//! over the configured agents and the history tree.

pub mod agents;
pub mod history;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Multi-agent chat orchestration and conversation history server.
#[derive(Parser)]
#[command(name = "agentdesk", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config.toml.
    #[arg(long, global = true, env = "AGENTDESK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server.
    Serve {
        /// Host to bind to (default from config).
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (default from config).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// List configured agents.
    Agents,

    /// List project directories in the history tree.
    Projects,

    /// List conversations of a project, most recent first.
    #[command(alias = "ls")]
    Histories {
        /// Encoded project name or a filesystem path.
        project: String,
    },

    /// Print one reconstructed conversation.
    #[command(alias = "show")]
    History {
        /// Encoded project name or a filesystem path.
        project: String,

        /// Session id.
        session: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_history_command() {
        let cli = Cli::try_parse_from(["agentdesk", "--json", "history", "/work/app", "abc"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::History { ref project, ref session } if project == "/work/app" && session == "abc"
        ));
    }
}
