// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs the forecasting / optimization scripts inside their
//! runtime environment using `tokio::process::Command`, captures both output
//! pipes, and enforces the execution bound.
//!
//! - [`environment`] holds the [`EnvironmentDescriptor`] (interpreter,
//!   environment name, timeout) validated at startup.
//! - [`launch`] turns a descriptor plus command line into a spawnable command.
//! - [`process`] owns one invocation end to end.
//! - [`output`] defines [`ExecutionResult`] and the single-writer collector.
//! - [`backend`] provides the [`ExecutorBackend`] trait and the production
//!   [`ProcessExecutor`], which tests can replace with a fake.

pub mod backend;
pub mod environment;
pub mod error;
mod launch;
pub mod output;
pub mod process;

pub use backend::{ExecFuture, ExecutorBackend, ProcessExecutor};
pub use environment::EnvironmentDescriptor;
pub use error::ExecError;
pub use output::{ExecutionResult, OutputLine, StreamSource};
pub use process::execute;
