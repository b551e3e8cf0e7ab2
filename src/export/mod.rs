// src/export/mod.rs

//! Materializes store series as delimited files for the scripts to read.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::config::ExportSection;
use crate::errors::{IndexcastError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::store::{IndexSeries, IndexStore};
use crate::types::IndexKey;

pub type ExportFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Something that can write an index series to disk before a script runs.
pub trait SeriesExporter: Send + Sync {
    /// Export one series, replacing any previous file, and return its path.
    fn export_series<'a>(&'a self, index: IndexKey) -> ExportFuture<'a, PathBuf>;

    /// Export every index, one after the other, in catalogue order.
    fn export_all<'a>(&'a self) -> ExportFuture<'a, Vec<PathBuf>> {
        Box::pin(async move {
            let mut paths = Vec::with_capacity(IndexKey::COUNT);
            for index in IndexKey::all() {
                paths.push(self.export_series(*index).await?);
            }
            Ok(paths)
        })
    }
}

/// Writes `<dir>/<index>.csv` with a `Dates<sep><index>` header.
///
/// Overlapping exports of the same index are serialized by a per-index lock;
/// different indices export concurrently.
#[derive(Debug)]
pub struct CsvExporter {
    store: IndexStore,
    fs: Arc<dyn FileSystem>,
    dir: PathBuf,
    separator: String,
    locks: [Mutex<()>; IndexKey::COUNT],
}

impl CsvExporter {
    pub fn new(store: IndexStore, section: &ExportSection) -> Self {
        Self::with_fs(store, section, Arc::new(RealFileSystem))
    }

    pub fn with_fs(store: IndexStore, section: &ExportSection, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            store,
            fs,
            dir: section.dir.clone(),
            separator: section.separator.clone(),
            locks: std::array::from_fn(|_| Mutex::new(())),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, index: IndexKey) -> PathBuf {
        self.dir.join(index.csv_file_name())
    }

    async fn export(&self, index: IndexKey) -> Result<PathBuf> {
        let _guard = self.locks[index.position()].lock().await;

        let series = self
            .store
            .load_series(index)
            .await
            .map_err(|e| export_failure(index, e))?;

        let path = self.path_for(index);
        let contents = render_csv(&series, &self.separator);
        let fs = Arc::clone(&self.fs);
        let target = path.clone();

        tokio::task::spawn_blocking(move || fs.write(&target, contents.as_bytes()))
            .await
            .map_err(|e| export_failure(index, e))?
            .map_err(|e| export_failure(index, e))?;

        info!(
            index = %index,
            path = %path.display(),
            rows = series.points.len(),
            "exported index series"
        );
        Ok(path)
    }
}

impl SeriesExporter for CsvExporter {
    fn export_series<'a>(&'a self, index: IndexKey) -> ExportFuture<'a, PathBuf> {
        Box::pin(self.export(index))
    }
}

fn export_failure(index: IndexKey, err: impl std::fmt::Display) -> IndexcastError {
    error!(index = %index, error = %err, "index export failed");
    IndexcastError::ExportWriteFailure {
        index: index.to_string(),
        reason: err.to_string(),
    }
}

/// Render a series as delimited text: header line, then one line per point.
pub fn render_csv(series: &IndexSeries, separator: &str) -> String {
    let mut out = String::with_capacity(32 * (series.points.len() + 1));
    out.push_str("Dates");
    out.push_str(separator);
    out.push_str(series.index.as_str());
    out.push('\n');

    for point in &series.points {
        out.push_str(&point.date);
        out.push_str(separator);
        out.push_str(&point.value);
        out.push('\n');
    }

    debug!(index = %series.index, bytes = out.len(), "rendered csv");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::store::SeriesPoint;

    fn section() -> ExportSection {
        ExportSection {
            dir: PathBuf::from("assets"),
            separator: ";".to_string(),
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let series = IndexSeries {
            index: IndexKey::MsciEm,
            points: vec![
                SeriesPoint { date: "2020-01-02".into(), value: "1114.66".into() },
                SeriesPoint { date: "2020-01-03".into(), value: "1107.59".into() },
            ],
        };

        assert_eq!(
            render_csv(&series, ";"),
            "Dates;MSCI_EM\n2020-01-02;1114.66\n2020-01-03;1107.59\n"
        );
    }

    #[tokio::test]
    async fn second_export_replaces_the_first() {
        let store = IndexStore::in_memory().unwrap();
        store.insert_row("2020-01-02", &[(IndexKey::Sp500, 1.0)]).unwrap();

        let fs = MockFileSystem::new();
        let exporter = CsvExporter::with_fs(store.clone(), &section(), Arc::new(fs.clone()));

        let path = exporter.export_series(IndexKey::Sp500).await.unwrap();
        assert_eq!(path, PathBuf::from("assets/S&P_500_INDEX.csv"));
        assert_eq!(
            fs.contents(&path).unwrap(),
            "Dates;S&P_500_INDEX\n2020-01-02;1\n"
        );

        store.update_value("2020-01-02", IndexKey::Sp500, 2.5).unwrap();
        exporter.export_series(IndexKey::Sp500).await.unwrap();
        assert_eq!(
            fs.contents(&path).unwrap(),
            "Dates;S&P_500_INDEX\n2020-01-02;2.5\n"
        );
    }

    #[tokio::test]
    async fn export_all_writes_every_index_in_order() {
        let store = IndexStore::in_memory().unwrap();
        let fs = MockFileSystem::new();
        let exporter = CsvExporter::with_fs(store, &section(), Arc::new(fs.clone()));

        let paths = exporter.export_all().await.unwrap();
        let expected: Vec<PathBuf> = IndexKey::all()
            .iter()
            .map(|k| PathBuf::from("assets").join(k.csv_file_name()))
            .collect();
        assert_eq!(paths, expected);
        assert_eq!(fs.writes(), expected);
    }

    #[tokio::test]
    async fn write_failure_is_reported_as_export_failure() {
        let store = IndexStore::in_memory().unwrap();
        let fs = MockFileSystem::new();
        fs.deny_writes("assets/MSCI_EURO.csv");
        let exporter = CsvExporter::with_fs(store, &section(), Arc::new(fs));

        let err = exporter.export_series(IndexKey::MsciEuro).await.unwrap_err();
        assert!(matches!(
            err,
            IndexcastError::ExportWriteFailure { ref index, .. } if index == "MSCI_EURO"
        ));
    }
}
