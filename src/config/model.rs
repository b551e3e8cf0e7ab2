// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

use crate::types::{LaunchMode, SelectorPolicy};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [runtime]
/// interpreter = "/opt/conda/bin/activate"
/// environment = "forecast"
/// timeout_ms = 10000
///
/// [store]
/// database = "data/indici.sqlite"
///
/// [export]
/// dir = "Models/assets"
///
/// [scripts]
/// forecast = "Models/python/forecast_arima.py"
/// portfolio = "Models/python/get_optimum_portfolio.py"
///
/// [server]
/// port = 8080
/// ```
///
/// Only `[runtime]` is mandatory; every other section has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub store: StoreSection,

    #[serde(default)]
    pub export: ExportSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    #[serde(default)]
    pub server: ServerSection,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (or the
/// loader), so holders can rely on the checks in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runtime: RuntimeSection,
    pub store: StoreSection,
    pub export: ExportSection,
    pub scripts: ScriptsSection,
    pub server: ServerSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            runtime: raw.runtime,
            store: raw.store,
            export: raw.export,
            scripts: raw.scripts,
            server: raw.server,
        }
    }
}

/// `[runtime]` section: where the interpreter lives and how to reach it.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeSection {
    /// Activation script (`launch = "activate"`) or conda executable
    /// (`launch = "conda-run"`). Must exist when the service starts.
    pub interpreter: PathBuf,

    /// Name of the runtime environment to activate.
    pub environment: String,

    /// Interpreter program run inside the activated environment.
    #[serde(default = "default_python")]
    pub python: String,

    /// Upper bound for one script invocation, in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default)]
    pub launch: LaunchMode,

    /// Shell used in `activate` mode. It must support `. file args`.
    #[serde(default = "default_shell")]
    pub shell: String,

    /// Regex; stderr lines matching it are merged into the combined output.
    #[serde(default = "default_error_marker")]
    pub error_marker: String,

    /// Working directory for the child process. Defaults to the service's.
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl RuntimeSection {
    pub fn new(interpreter: impl Into<PathBuf>, environment: impl Into<String>) -> Self {
        Self {
            interpreter: interpreter.into(),
            environment: environment.into(),
            python: default_python(),
            timeout_ms: default_timeout_ms(),
            launch: LaunchMode::default(),
            shell: default_shell(),
            error_marker: default_error_marker(),
            working_dir: None,
        }
    }
}

fn default_python() -> String {
    "python".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_error_marker() -> String {
    "^Error".to_string()
}

/// `[store]` section: the SQLite database holding the index history.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    #[serde(default = "default_database")]
    pub database: PathBuf,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_date_column")]
    pub date_column: String,
}

fn default_database() -> PathBuf {
    PathBuf::from("data/indici.sqlite")
}

fn default_table() -> String {
    "serie storica indici".to_string()
}

fn default_date_column() -> String {
    "Dates".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            database: default_database(),
            table: default_table(),
            date_column: default_date_column(),
        }
    }
}

/// `[export]` section: where series are materialized for the scripts.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSection {
    #[serde(default = "default_export_dir")]
    pub dir: PathBuf,

    /// Single-character field separator.
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_export_dir() -> PathBuf {
    PathBuf::from("Models/assets")
}

fn default_separator() -> String {
    ";".to_string()
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            dir: default_export_dir(),
            separator: default_separator(),
        }
    }
}

/// `[scripts]` section: the opaque programs the interpreter runs.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_forecast_script")]
    pub forecast: String,

    #[serde(default = "default_portfolio_script")]
    pub portfolio: String,
}

fn default_forecast_script() -> String {
    "Models/python/forecast_arima.py".to_string()
}

fn default_portfolio_script() -> String {
    "Models/python/get_optimum_portfolio.py".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            forecast: default_forecast_script(),
            portfolio: default_portfolio_script(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub out_of_range_selector: SelectorPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            out_of_range_selector: SelectorPolicy::default(),
        }
    }
}
