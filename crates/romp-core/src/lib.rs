pub mod board;
pub mod calendar;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dates;
pub mod render;
pub mod storage;
pub mod transfer;

use std::ffi::OsString;

use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[tracing::instrument(skip_all)]
pub fn run(raw_args: Vec<OsString>) -> anyhow::Result<()> {
    let args = cli::Cli::parse_from(raw_args);

    cli::init_tracing(args.verbose, args.quiet)?;
    info!(verbose = args.verbose, quiet = args.quiet, "starting romp");

    let mut cfg = config::Config::load(args.config.as_deref())?;
    cfg.apply_overrides(
        args.rc_overrides
            .into_iter()
            .map(|kv| (kv.key, kv.value)),
    );

    let data_dir = config::resolve_data_dir(&cfg, args.data.as_deref())
        .context("failed to resolve data directory")?;
    let store = storage::BoardStore::open(&data_dir)
        .with_context(|| format!("failed to open board store at {}", data_dir.display()))?;

    let renderer = render::Renderer::new(&cfg);
    let command = match args.command {
        Some(command) => command,
        None => {
            let fallback = commands::default_command(&cfg);
            debug!(?fallback, "no explicit command, using default");
            fallback
        }
    };

    commands::dispatch(&store, &renderer, command)?;

    info!("done");
    Ok(())
}
