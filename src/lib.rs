// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod export;
pub mod fs;
pub mod logging;
pub mod server;
pub mod store;
pub mod tasks;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::ConfigFile;
use crate::server::AppState;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the environment descriptor (fails fast on a missing interpreter)
/// - store, exporter, executor and task orchestrators
/// - the HTTP server with Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;

    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let state = AppState::from_config(&cfg)?;
    info!(
        config = %config_path.display(),
        environment = %state.environment.environment(),
        "indexcast starting"
    );

    server::serve(&cfg.server.host, cfg.server.port, state).await
}

/// Simple dry-run output: print the resolved configuration.
fn print_dry_run(cfg: &ConfigFile) {
    println!("indexcast dry-run");
    println!("  runtime.interpreter = {}", cfg.runtime.interpreter.display());
    println!("  runtime.environment = {}", cfg.runtime.environment);
    println!("  runtime.python = {}", cfg.runtime.python);
    println!("  runtime.launch = {:?}", cfg.runtime.launch);
    if cfg.runtime.launch == types::LaunchMode::Activate {
        println!("  runtime.shell = {}", cfg.runtime.shell);
    }
    println!("  runtime.timeout_ms = {}", cfg.runtime.timeout_ms);
    println!("  runtime.error_marker = {}", cfg.runtime.error_marker);
    if let Some(ref dir) = cfg.runtime.working_dir {
        println!("  runtime.working_dir = {}", dir.display());
    }
    println!();
    println!("  store.database = {}", cfg.store.database.display());
    println!("  store.table = {}", cfg.store.table);
    println!("  export.dir = {}", cfg.export.dir.display());
    println!("  export.separator = {:?}", cfg.export.separator);
    println!("  scripts.forecast = {}", cfg.scripts.forecast);
    println!("  scripts.portfolio = {}", cfg.scripts.portfolio);
    println!();
    println!("  server = {}:{}", cfg.server.host, cfg.server.port);
    println!(
        "  server.out_of_range_selector = {:?}",
        cfg.server.out_of_range_selector
    );

    println!();
    println!("indices ({}):", types::IndexKey::COUNT);
    for (i, index) in types::IndexKey::all().iter().enumerate() {
        println!("  {i}: {index}");
    }

    debug!("dry-run complete (no server started)");
}
