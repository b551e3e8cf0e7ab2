use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;

use indexcast::errors::IndexcastError;
use indexcast::exec::{ExecError, ExecFuture, ExecutionResult, ExecutorBackend};
use indexcast::export::{ExportFuture, SeriesExporter};
use indexcast::types::IndexKey;

/// Build the result a well-behaved script printing `text` would produce.
pub fn stdout_result(text: &str) -> ExecutionResult {
    let mut combined = String::new();
    for line in text.lines() {
        combined.push_str(line);
        combined.push('\n');
    }
    ExecutionResult {
        stdout_lines: text.lines().count(),
        combined_output: combined,
        diagnostics: Vec::new(),
        exit_code: Some(0),
    }
}

/// A fake executor that:
/// - records every command line it was asked to run
/// - answers from a queue of canned responses, then falls back to a default
///   stdout payload.
pub struct FakeExecutor {
    default_output: String,
    queued: Mutex<VecDeque<Result<ExecutionResult, ExecError>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeExecutor {
    pub fn new(default_output: &str) -> Self {
        Self {
            default_output: default_output.to_string(),
            queued: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn push_response(&self, response: Result<ExecutionResult, ExecError>) {
        self.queued.lock().unwrap().push_back(response);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ExecutorBackend for FakeExecutor {
    fn execute<'a>(&'a self, command_line: &'a str) -> ExecFuture<'a> {
        Box::pin(async move {
            self.calls.lock().unwrap().push(command_line.to_string());

            let queued = self.queued.lock().unwrap().pop_front();
            queued.unwrap_or_else(|| Ok(stdout_result(&self.default_output)))
        })
    }
}

/// A fake exporter that records which indices were exported and returns
/// `<dir>/<index>.csv` without touching disk.
pub struct FakeExporter {
    dir: PathBuf,
    exported: Mutex<Vec<IndexKey>>,
    failing: Mutex<HashSet<IndexKey>>,
}

impl FakeExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            exported: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make exports of `index` fail from now on.
    pub fn fail_on(&self, index: IndexKey) {
        self.failing.lock().unwrap().insert(index);
    }

    pub fn exported(&self) -> Vec<IndexKey> {
        self.exported.lock().unwrap().clone()
    }
}

impl SeriesExporter for FakeExporter {
    fn export_series<'a>(&'a self, index: IndexKey) -> ExportFuture<'a, PathBuf> {
        Box::pin(async move {
            if self.failing.lock().unwrap().contains(&index) {
                return Err(IndexcastError::ExportWriteFailure {
                    index: index.to_string(),
                    reason: "disk full".to_string(),
                });
            }
            self.exported.lock().unwrap().push(index);
            Ok(self.dir.join(index.csv_file_name()))
        })
    }
}
