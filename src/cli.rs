// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `indexcast`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "indexcast",
    version,
    about = "Serve index forecasts and portfolio allocations computed by external scripts.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Indexcast.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Indexcast.toml")]
    pub config: String,

    /// Override `[server].host` from the config file.
    #[arg(long, value_name = "HOST")]
    pub host: Option<String>,

    /// Override `[server].port` from the config file.
    #[arg(long, value_name = "PORT")]
    pub port: Option<u16>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `INDEXCAST_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate the config, print it, but don't start the server.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
