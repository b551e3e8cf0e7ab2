// src/config/validate.rs

use regex::Regex;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{IndexcastError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = IndexcastError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_runtime(cfg)?;
    validate_store(cfg)?;
    validate_export(cfg)?;
    validate_scripts(cfg)?;
    Ok(())
}

fn invalid(msg: impl Into<String>) -> IndexcastError {
    IndexcastError::ConfigInvalid(msg.into())
}

fn require_non_empty(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

fn validate_runtime(cfg: &RawConfigFile) -> Result<()> {
    let rt = &cfg.runtime;

    if rt.interpreter.as_os_str().is_empty() {
        return Err(invalid("[runtime].interpreter must not be empty"));
    }
    require_non_empty(&rt.environment, "[runtime].environment")?;
    require_non_empty(&rt.python, "[runtime].python")?;
    require_non_empty(&rt.shell, "[runtime].shell")?;

    if rt.timeout_ms == 0 {
        return Err(invalid("[runtime].timeout_ms must be >= 1 (got 0)"));
    }

    Regex::new(&rt.error_marker).map_err(|e| {
        invalid(format!(
            "[runtime].error_marker is not a valid regex ({}): {e}",
            rt.error_marker
        ))
    })?;

    Ok(())
}

fn validate_store(cfg: &RawConfigFile) -> Result<()> {
    if cfg.store.database.as_os_str().is_empty() {
        return Err(invalid("[store].database must not be empty"));
    }
    require_non_empty(&cfg.store.table, "[store].table")?;
    require_non_empty(&cfg.store.date_column, "[store].date_column")?;
    Ok(())
}

fn validate_export(cfg: &RawConfigFile) -> Result<()> {
    let sep = &cfg.export.separator;
    let mut chars = sep.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\n' && c != '\r' => Ok(()),
        _ => Err(invalid(format!(
            "[export].separator must be exactly one non-newline character (got {sep:?})"
        ))),
    }
}

fn validate_scripts(cfg: &RawConfigFile) -> Result<()> {
    require_non_empty(&cfg.scripts.forecast, "[scripts].forecast")?;
    require_non_empty(&cfg.scripts.portfolio, "[scripts].portfolio")?;
    Ok(())
}
