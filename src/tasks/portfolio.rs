// src/tasks/portfolio.rs

use std::sync::Arc;

use tracing::{error, info};

use crate::exec::ExecutorBackend;
use crate::export::SeriesExporter;

use super::{into_payload, quote_arg, TaskError};

/// Optimal allocation across all indices: export every series, then run the
/// optimizer script, which reads all the files itself.
pub struct PortfolioTask {
    executor: Arc<dyn ExecutorBackend>,
    exporter: Arc<dyn SeriesExporter>,
    script: String,
}

impl PortfolioTask {
    pub fn new(
        executor: Arc<dyn ExecutorBackend>,
        exporter: Arc<dyn SeriesExporter>,
        script: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            exporter,
            script: script.into(),
        }
    }

    pub fn command_line(&self) -> Result<String, TaskError> {
        quote_arg(&self.script)
    }

    pub async fn optimize(&self) -> Result<String, TaskError> {
        let result = self.run().await;
        if let Err(ref e) = result {
            error!(kind = e.kind(), error = %e, "portfolio optimization failed");
        }
        result
    }

    async fn run(&self) -> Result<String, TaskError> {
        let files = self.exporter.export_all().await.map_err(TaskError::Export)?;

        let command_line = self.command_line()?;
        info!(inputs = files.len(), cmd = %command_line, "running portfolio optimizer");

        let result = self.executor.execute(&command_line).await?;
        into_payload("portfolio", result)
    }
}
