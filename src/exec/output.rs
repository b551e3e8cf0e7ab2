// src/exec/output.rs

//! Captured process output and the single-writer buffer that builds it.

use regex::Regex;
use serde::Serialize;

/// Which pipe a captured line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamSource {
    Stdout,
    Stderr,
}

/// One line read from a child pipe, without its line terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub source: StreamSource,
    pub text: String,
}

/// The consolidated result of one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    /// Every stdout line plus the stderr lines matching the error marker,
    /// in arrival order, each terminated by `\n`.
    pub combined_output: String,

    /// Every stderr line, marked or not.
    pub diagnostics: Vec<String>,

    /// `None` when the process was ended by a signal or never reaped.
    pub exit_code: Option<i32>,

    /// Number of stdout lines folded into `combined_output`.
    pub stdout_lines: usize,
}

impl ExecutionResult {
    /// True when the combined output is empty or whitespace only.
    pub fn is_empty(&self) -> bool {
        self.combined_output.trim().is_empty()
    }

    pub fn into_output(self) -> String {
        self.combined_output
    }
}

/// Accumulates lines from both readers.
///
/// Only the task awaiting the process owns one of these; the readers reach it
/// through a channel, so appends are never concurrent.
#[derive(Debug)]
pub(crate) struct OutputCollector<'a> {
    error_marker: &'a Regex,
    result: ExecutionResult,
}

impl<'a> OutputCollector<'a> {
    pub(crate) fn new(error_marker: &'a Regex) -> Self {
        Self {
            error_marker,
            result: ExecutionResult::default(),
        }
    }

    pub(crate) fn push(&mut self, line: OutputLine) {
        match line.source {
            StreamSource::Stdout => {
                self.append(&line.text);
                self.result.stdout_lines += 1;
            }
            StreamSource::Stderr => {
                if self.error_marker.is_match(&line.text) {
                    self.append(&line.text);
                }
                self.result.diagnostics.push(line.text);
            }
        }
    }

    pub(crate) fn finish(self) -> ExecutionResult {
        self.result
    }

    fn append(&mut self, text: &str) {
        self.result.combined_output.push_str(text);
        self.result.combined_output.push('\n');
    }
}
