// src/exec/environment.rs

//! The runtime environment every script invocation is launched into.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use regex::Regex;
use tracing::info;

use crate::config::RuntimeSection;
use crate::errors::{IndexcastError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::LaunchMode;

/// Interpreter location, environment name and execution bound.
///
/// Built once at startup and shared (behind an `Arc`) by every invocation.
/// Everything is read-only except the timeout, which an operator may tune
/// between invocations; an invocation reads it once when it starts.
#[derive(Debug)]
pub struct EnvironmentDescriptor {
    interpreter: PathBuf,
    environment: String,
    python: String,
    launch: LaunchMode,
    shell: String,
    working_dir: Option<PathBuf>,
    error_marker: Regex,
    timeout_ms: AtomicU64,
}

impl EnvironmentDescriptor {
    /// Descriptor with default launch settings (`activate` mode, `bash`,
    /// `python`, `^Error` marker).
    ///
    /// Fails with [`IndexcastError::ConfigInvalid`] if the interpreter path
    /// is empty or does not exist, or if `timeout` is zero.
    pub fn new(
        interpreter: impl Into<PathBuf>,
        environment: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut section = RuntimeSection::new(interpreter, environment);
        section.timeout_ms = duration_to_millis(timeout)?;
        Self::from_config(&section)
    }

    pub fn from_config(section: &RuntimeSection) -> Result<Self> {
        Self::from_config_with_fs(section, &RealFileSystem)
    }

    pub fn from_config_with_fs(section: &RuntimeSection, fs: &dyn FileSystem) -> Result<Self> {
        if section.interpreter.as_os_str().is_empty() {
            return Err(IndexcastError::ConfigInvalid(
                "interpreter path is absent".to_string(),
            ));
        }
        if !fs.is_file(&section.interpreter) {
            return Err(IndexcastError::ConfigInvalid(format!(
                "interpreter not found: {}",
                section.interpreter.display()
            )));
        }
        if section.environment.trim().is_empty() {
            return Err(IndexcastError::ConfigInvalid(
                "runtime environment name is absent".to_string(),
            ));
        }
        if section.timeout_ms == 0 {
            return Err(IndexcastError::ConfigInvalid(
                "timeout must be greater than zero".to_string(),
            ));
        }

        let error_marker = Regex::new(&section.error_marker).map_err(|e| {
            IndexcastError::ConfigInvalid(format!("invalid error marker regex: {e}"))
        })?;

        info!(
            interpreter = %section.interpreter.display(),
            environment = %section.environment,
            launch = ?section.launch,
            timeout_ms = section.timeout_ms,
            "runtime environment configured"
        );

        Ok(Self {
            interpreter: section.interpreter.clone(),
            environment: section.environment.clone(),
            python: section.python.clone(),
            launch: section.launch,
            shell: section.shell.clone(),
            working_dir: section.working_dir.clone(),
            error_marker,
            timeout_ms: AtomicU64::new(section.timeout_ms),
        })
    }

    pub fn with_python(mut self, python: impl Into<String>) -> Self {
        self.python = python.into();
        self
    }

    pub fn with_launch_mode(mut self, launch: LaunchMode) -> Self {
        self.launch = launch;
        self
    }

    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_error_marker(mut self, pattern: &str) -> Result<Self> {
        self.error_marker = Regex::new(pattern).map_err(|e| {
            IndexcastError::ConfigInvalid(format!("invalid error marker regex: {e}"))
        })?;
        Ok(self)
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn python(&self) -> &str {
        &self.python
    }

    pub fn launch_mode(&self) -> LaunchMode {
        self.launch
    }

    pub fn shell(&self) -> &str {
        &self.shell
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    pub fn error_marker(&self) -> &Regex {
        &self.error_marker
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.load(Ordering::Relaxed))
    }

    /// Adjust the execution bound. Invocations already running keep the
    /// value they started with.
    pub fn set_timeout(&self, timeout: Duration) -> Result<()> {
        let ms = duration_to_millis(timeout)?;
        let previous = self.timeout_ms.swap(ms, Ordering::Relaxed);
        info!(previous_ms = previous, timeout_ms = ms, "execution timeout adjusted");
        Ok(())
    }
}

fn duration_to_millis(timeout: Duration) -> Result<u64> {
    let ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
    if ms == 0 {
        return Err(IndexcastError::ConfigInvalid(
            "timeout must be greater than zero".to_string(),
        ));
    }
    Ok(ms)
}
