// src/exec/error.rs

use std::time::Duration;

use thiserror::Error;

use super::output::ExecutionResult;

/// Ways a single invocation can fail.
///
/// An empty result is *not* one of them; callers decide what emptiness means.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The child process could not be started (missing shell, permission
    /// denied, resource exhaustion, unsplittable command line).
    #[error("launch failed for `{program}`: {source}")]
    LaunchFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The process outlived the execution bound and was killed along with
    /// its process group. `partial` holds whatever was captured before that.
    #[error("process timed out after {}ms", timeout.as_millis())]
    Timeout {
        timeout: Duration,
        partial: ExecutionResult,
    },

    /// The process failed and left nothing in the combined output.
    #[error("process exited with code {code:?} and produced no output")]
    NonZeroExit {
        code: Option<i32>,
        diagnostics: Vec<String>,
    },

    #[error("waiting for process failed: {0}")]
    Wait(#[source] std::io::Error),
}

impl ExecError {
    /// Short stable name used in logs and HTTP error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ExecError::LaunchFailed { .. } => "launch_failed",
            ExecError::Timeout { .. } => "timeout",
            ExecError::NonZeroExit { .. } => "execution_error",
            ExecError::Wait(_) => "execution_error",
        }
    }
}
