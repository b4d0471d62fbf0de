pub mod cli;
pub mod commands;
pub mod config;
pub mod datetime;
pub mod edit;
pub mod manager;
pub mod render;
pub mod store;
pub mod task;
pub mod view;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let cli = cli::GlobalCli::parse_from(raw_args);
    cli::init_tracing(cli.verbose, cli.quiet)?;

    info!(verbose = cli.verbose, quiet = cli.quiet, "starting jot CLI");

    let mut cfg = config::Config::load(cli.rc_file.as_deref())?;
    cfg.apply_overrides(
        cli.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let data_dir = config::resolve_data_dir(&cfg, cli.data.as_deref())
        .context("failed to resolve data directory")?;
    debug!(data_dir = %data_dir.display(), "resolved data directory");

    let store = store::JsonFileStore::open(&data_dir, store::TASKS_SLOT)
        .with_context(|| format!("failed to open task store in {}", data_dir.display()))?;
    let mut board = manager::TaskBoard::open(store);
    commands::seed_view_state(&mut board, &cfg)?;

    let today = datetime::today();
    let mut renderer = render::TableRenderer::new(&cfg, today)?;

    let command = cli.command.unwrap_or(cli::Command::List {
        filter: None,
        sort: None,
    });
    commands::dispatch(&mut board, &mut renderer, command, today)?;

    info!("done");
    Ok(())
}
