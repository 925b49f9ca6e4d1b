use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::board::Row;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "romp",
    version,
    about = "romp: a two-row task board with a date-aware calendar"
)]
pub struct Cli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    /// Path to the config file (defaults to $ROMPRC, then ~/.romprc).
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Data directory holding board.json (overrides data.location).
    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Config overrides, e.g. --rc color=off.
    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render both rows of the board (the default).
    Show,

    /// Create a section at the tail of a row.
    AddSection {
        name: String,
        #[arg(long, value_enum, default_value = "top")]
        row: Row,
    },

    /// Rename a section; its id and position stay put.
    RenameSection { section: String, name: String },

    /// Delete a section and every task inside it.
    DeleteSection { section: String },

    /// Add a task to a section.
    Add {
        section: String,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Flip a task between done and open.
    Toggle { todo: String },

    /// Replace a task's text.
    Edit {
        todo: String,
        #[arg(required = true, trailing_var_arg = true)]
        text: Vec<String>,
    },

    /// Delete a task.
    Delete { todo: String },

    /// Move a task to another section (appends at the tail).
    Move { todo: String, section: String },

    /// Move a section onto another section's position.
    MoveSection { section: String, target: String },

    /// Apply a raw transfer payload to a target section. Malformed or stale
    /// payloads are dropped silently, like an abandoned drag.
    Drop {
        payload: String,
        #[arg(long = "on")]
        on: String,
    },

    /// Render a month calendar highlighting dates mentioned in tasks.
    Calendar {
        /// Month to display as YYYY-MM (defaults to the current month).
        #[arg(long)]
        month: Option<String>,
        /// Shift the displayed month forward.
        #[arg(long, conflicts_with = "prev")]
        next: Option<u16>,
        /// Shift the displayed month backward.
        #[arg(long, conflicts_with = "next")]
        prev: Option<u16>,
    },
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
