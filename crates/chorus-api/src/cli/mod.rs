//! CLI command definitions for the `chorus` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod models;
pub mod run;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Generate conversations between AI bots with different personas.
#[derive(Parser)]
#[command(name = "chorus", version, about, long_about = None)]
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

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a conversation between the bots listed in a roster file.
    Run {
        /// TOML file with a `[[bots]]` entry (name, model, prompt) per bot.
        #[arg(short, long)]
        roster: PathBuf,

        /// Rounds to generate (every bot speaks once per round).
        #[arg(short, long)]
        iterations: Option<u32>,

        /// Message the first bot responds to.
        #[arg(short = 'm', long)]
        initial_message: Option<String>,

        /// Continue the finished conversation for this many extra rounds.
        #[arg(long)]
        more: Option<u32>,
    },

    /// List supported models and whether their provider is configured.
    Models,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
