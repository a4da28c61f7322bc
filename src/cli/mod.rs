//! CLI module for Pensum.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// Pensum - question answering over course materials
///
/// Ingest course documents into a vector index, then ask questions that are
/// answered by a tool-using model with lesson-level citations.
#[derive(Parser, Debug)]
#[command(name = "pensum")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "PENSUM_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Index every course document (.txt, .md) in a folder
    Ingest {
        /// Folder containing course documents
        folder: String,

        /// Remove all indexed courses before ingesting
        #[arg(long)]
        clear: bool,
    },

    /// Ask a single question about the indexed courses
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Maximum number of tool rounds before a final answer is forced
        #[arg(short = 'r', long)]
        max_rounds: Option<usize>,
    },

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// List indexed courses
    Courses,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "8000")]
        port: u16,

        /// Ingest this folder before serving
        #[arg(long)]
        docs: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask() {
        let cli = Cli::try_parse_from(["pensum", "-vv", "ask", "What is MCP?", "--max-rounds", "2"])
            .unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Ask {
                question,
                model,
                max_rounds,
            } => {
                assert_eq!(question, "What is MCP?");
                assert_eq!(model, None);
                assert_eq!(max_rounds, Some(2));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ingest_and_config() {
        let cli = Cli::try_parse_from(["pensum", "ingest", "docs", "--clear"]).unwrap();
        assert!(matches!(cli.command, Commands::Ingest { ref folder, clear: true } if folder == "docs"));

        let cli = Cli::try_parse_from(["pensum", "config", "path"]).unwrap();
        assert!(matches!(cli.command, Commands::Config { action: ConfigAction::Path }));
    }
}
