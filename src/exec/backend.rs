// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The task orchestrators talk to an `ExecutorBackend` instead of spawning
//! processes themselves. This makes it easy to swap in a fake executor in
//! tests while keeping the production implementation in [`process`].
//!
//! [`process`]: super::process

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::environment::EnvironmentDescriptor;
use super::error::ExecError;
use super::output::ExecutionResult;
use super::process;

pub type ExecFuture<'a> =
    Pin<Box<dyn Future<Output = Result<ExecutionResult, ExecError>> + Send + 'a>>;

/// Trait abstracting how a script command line is executed.
///
/// Production code uses [`ProcessExecutor`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send + Sync {
    /// Run one command line and return exactly one result for it.
    fn execute<'a>(&'a self, command_line: &'a str) -> ExecFuture<'a>;
}

/// Real executor used in production: spawns the interpreter inside the
/// configured environment for every call.
///
/// Calls are independent; each owns its child process and output buffer, so
/// any number may run at once.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    env: Arc<EnvironmentDescriptor>,
}

impl ProcessExecutor {
    pub fn new(env: Arc<EnvironmentDescriptor>) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &Arc<EnvironmentDescriptor> {
        &self.env
    }
}

impl ExecutorBackend for ProcessExecutor {
    fn execute<'a>(&'a self, command_line: &'a str) -> ExecFuture<'a> {
        Box::pin(process::execute(&self.env, command_line))
    }
}

