#![allow(dead_code)]

use std::path::{Path, PathBuf};

use indexcast::config::{
    ConfigFile, ExportSection, RawConfigFile, RuntimeSection, ScriptsSection, ServerSection,
    StoreSection,
};
use indexcast::types::{LaunchMode, SelectorPolicy};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(interpreter: impl AsRef<Path>, environment: &str) -> Self {
        Self {
            config: RawConfigFile {
                runtime: RuntimeSection::new(interpreter.as_ref(), environment),
                store: StoreSection::default(),
                export: ExportSection::default(),
                scripts: ScriptsSection::default(),
                server: ServerSection::default(),
            },
        }
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.runtime.timeout_ms = ms;
        self
    }

    pub fn python(mut self, python: &str) -> Self {
        self.config.runtime.python = python.to_string();
        self
    }

    pub fn shell(mut self, shell: &str) -> Self {
        self.config.runtime.shell = shell.to_string();
        self
    }

    pub fn launch(mut self, launch: LaunchMode) -> Self {
        self.config.runtime.launch = launch;
        self
    }

    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.store.database = path.into();
        self
    }

    pub fn export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.export.dir = dir.into();
        self
    }

    pub fn scripts(mut self, forecast: &str, portfolio: &str) -> Self {
        self.config.scripts.forecast = forecast.to_string();
        self.config.scripts.portfolio = portfolio.to_string();
        self
    }

    pub fn selector_policy(mut self, policy: SelectorPolicy) -> Self {
        self.config.server.out_of_range_selector = policy;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
