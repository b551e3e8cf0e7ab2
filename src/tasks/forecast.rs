// src/tasks/forecast.rs

use std::sync::Arc;

use tracing::{error, info};

use crate::exec::ExecutorBackend;
use crate::export::SeriesExporter;
use crate::types::{IndexKey, SelectorPolicy};

use super::{into_payload, quote_arg, TaskError};

/// Forecast for a single index: export its series, run the forecasting
/// script on the exported file, return the script's output as-is.
///
/// The script receives the bare file name (`MSCI_EM.csv`), not a path; it
/// resolves the name against the export directory itself.
pub struct ForecastTask {
    executor: Arc<dyn ExecutorBackend>,
    exporter: Arc<dyn SeriesExporter>,
    script: String,
}

impl ForecastTask {
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

    /// `<script> <quoted csv file name>`.
    pub fn command_line(&self, index: IndexKey) -> Result<String, TaskError> {
        Ok(format!(
            "{} {}",
            quote_arg(&self.script)?,
            quote_arg(&index.csv_file_name())?
        ))
    }

    /// Resolve a client-supplied selector and forecast that index.
    pub async fn forecast_selector(
        &self,
        selector: i64,
        policy: SelectorPolicy,
    ) -> Result<String, TaskError> {
        let index = policy
            .resolve(selector)
            .ok_or(TaskError::SelectorOutOfRange(selector))?;
        self.forecast(index).await
    }

    pub async fn forecast(&self, index: IndexKey) -> Result<String, TaskError> {
        let result = self.run(index).await;
        if let Err(ref e) = result {
            error!(index = %index, kind = e.kind(), error = %e, "forecast failed");
        }
        result
    }

    async fn run(&self, index: IndexKey) -> Result<String, TaskError> {
        let csv = self
            .exporter
            .export_series(index)
            .await
            .map_err(TaskError::Export)?;

        let command_line = self.command_line(index)?;
        info!(
            index = %index,
            csv = %csv.display(),
            cmd = %command_line,
            "running forecast script"
        );

        let result = self.executor.execute(&command_line).await?;
        into_payload("forecast", result)
    }
}
