// src/tasks/mod.rs

//! Task orchestrators: export the inputs a script needs, run it through the
//! executor, and hand back its payload untouched.
//!
//! - [`forecast`] runs the forecasting script for one index.
//! - [`portfolio`] exports every index and runs the optimizer.

use std::io;

use thiserror::Error;
use tracing::warn;

use crate::errors::IndexcastError;
use crate::exec::{ExecError, ExecutionResult};

pub mod forecast;
pub mod portfolio;

pub use forecast::ForecastTask;
pub use portfolio::PortfolioTask;

/// Why a task produced no payload.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("index selector {0} is out of range")]
    SelectorOutOfRange(i64),

    /// Exporting the script's input failed; the script was not run.
    #[error(transparent)]
    Export(IndexcastError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    /// The script ran but its output was empty or whitespace only.
    #[error("{task} script produced no output")]
    EmptyOutput {
        task: &'static str,
        diagnostics: Vec<String>,
    },
}

impl TaskError {
    /// Short stable name used in logs and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            TaskError::SelectorOutOfRange(_) => "selector_out_of_range",
            TaskError::Export(_) => "export_failed",
            TaskError::Exec(e) => e.kind(),
            TaskError::EmptyOutput { .. } => "empty_output",
        }
    }
}

/// Turn an execution result into the payload handed to the client.
fn into_payload(task: &'static str, result: ExecutionResult) -> Result<String, TaskError> {
    if result.is_empty() {
        warn!(
            task,
            exit_code = ?result.exit_code,
            stderr_lines = result.diagnostics.len(),
            "script call failed or produced empty output"
        );
        return Err(TaskError::EmptyOutput {
            task,
            diagnostics: result.diagnostics,
        });
    }
    Ok(result.into_output())
}

/// Quote one command-line word so `&`, `$` and spaces reach the script intact.
fn quote_arg(word: &str) -> Result<String, TaskError> {
    shlex::try_quote(word)
        .map(|q| q.into_owned())
        .map_err(|e| {
            TaskError::Exec(ExecError::LaunchFailed {
                program: word.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, e.to_string()),
            })
        })
}
