use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

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
    name = "jot",
    version,
    about = "jot: a small task list manager",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "rc-file", global = true)]
    pub rc_file: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Add a new task
    Add {
        title: String,

        #[arg(long = "desc", default_value = "")]
        description: String,

        /// low, medium, or high
        #[arg(long, default_value = "medium")]
        priority: String,

        /// YYYY-MM-DD, today, tomorrow, +Nd, or none
        #[arg(long, default_value = "")]
        due: String,
    },

    /// Show the task list
    List {
        /// all, done, or todo
        #[arg(long)]
        filter: Option<String>,

        /// none, priority, or due
        #[arg(long)]
        sort: Option<String>,
    },

    /// Toggle completion of a task
    Done {
        /// Task id, or a unique prefix of one
        id: String,
    },

    /// Delete a task
    Delete {
        /// Task id, or a unique prefix of one
        id: String,
    },

    /// Edit one task's fields inline
    Edit {
        /// Task id, or a unique prefix of one
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long = "desc")]
        description: Option<String>,

        /// low, medium, or high
        #[arg(long)]
        priority: Option<String>,

        /// YYYY-MM-DD, today, tomorrow, +Nd, or none
        #[arg(long)]
        due: Option<String>,
    },

    /// Search titles and descriptions
    Search { query: String },
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
