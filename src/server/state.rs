// src/server/state.rs

use std::sync::Arc;

use tracing::info;

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::exec::{EnvironmentDescriptor, ExecutorBackend, ProcessExecutor};
use crate::export::{CsvExporter, SeriesExporter};
use crate::store::IndexStore;
use crate::tasks::{ForecastTask, PortfolioTask};
use crate::types::SelectorPolicy;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub forecast: Arc<ForecastTask>,
    pub portfolio: Arc<PortfolioTask>,
    pub store: IndexStore,
    pub environment: Arc<EnvironmentDescriptor>,
    pub selector_policy: SelectorPolicy,
}

impl AppState {
    /// Wire the production components described by `cfg`.
    ///
    /// Fails if the interpreter is missing or the database can't be opened,
    /// so a broken setup stops the service before it accepts requests.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let environment = Arc::new(EnvironmentDescriptor::from_config(&cfg.runtime)?);
        let store = IndexStore::open(&cfg.store)?;

        // One exporter for both tasks so they share the per-index locks.
        let exporter: Arc<dyn SeriesExporter> =
            Arc::new(CsvExporter::new(store.clone(), &cfg.export));
        let executor: Arc<dyn ExecutorBackend> =
            Arc::new(ProcessExecutor::new(Arc::clone(&environment)));

        info!(
            export_dir = %cfg.export.dir.display(),
            forecast_script = %cfg.scripts.forecast,
            portfolio_script = %cfg.scripts.portfolio,
            "task orchestrators ready"
        );

        Ok(Self {
            forecast: Arc::new(ForecastTask::new(
                Arc::clone(&executor),
                Arc::clone(&exporter),
                cfg.scripts.forecast.clone(),
            )),
            portfolio: Arc::new(PortfolioTask::new(
                executor,
                exporter,
                cfg.scripts.portfolio.clone(),
            )),
            store,
            environment,
            selector_policy: cfg.server.out_of_range_selector,
        })
    }
}
