// src/store/mod.rs

//! SQLite access to the index history table.
//!
//! The table has one date column and one `REAL` column per [`IndexKey`],
//! named exactly like the key. Column names contain `&`, `$` and `.`, so
//! every identifier is double-quoted.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::StoreSection;
use crate::errors::{IndexcastError, Result};
use crate::types::IndexKey;

/// One `(date, value)` pair, both kept as the text the store rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    pub date: String,
    pub value: String,
}

/// Snapshot of one index column, re-read on every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexSeries {
    pub index: IndexKey,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexValue {
    pub index: IndexKey,
    pub value: Option<f64>,
}

/// A full table row, as served by `GET /indices`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexRow {
    pub id: i64,
    pub date: String,
    pub values: Vec<IndexValue>,
}

/// Handle on the history database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct IndexStore {
    conn: Arc<Mutex<Connection>>,
    table: String,
    date_column: String,
}

impl IndexStore {
    pub fn open(section: &StoreSection) -> Result<Self> {
        let conn = Connection::open(&section.database)?;
        info!(database = %section.database.display(), table = %section.table, "opened index store");
        Ok(Self::from_connection(conn, section))
    }

    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let section = StoreSection {
            database: path.as_ref().to_path_buf(),
            ..StoreSection::default()
        };
        Self::open(&section)
    }

    /// In-memory store with the default table layout (for tests).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self::from_connection(conn, &StoreSection::default());
        store.create_table()?;
        Ok(store)
    }

    fn from_connection(conn: Connection, section: &StoreSection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            table: section.table.clone(),
            date_column: section.date_column.clone(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| IndexcastError::Other(anyhow!("index store lock poisoned")))
    }

    /// Create the history table if it does not exist yet.
    pub fn create_table(&self) -> Result<()> {
        let columns: Vec<String> = IndexKey::all()
            .iter()
            .map(|k| format!("{} REAL", quote_ident(k.as_str())))
            .collect();
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\"PK_UID\" INTEGER PRIMARY KEY AUTOINCREMENT, {} TEXT NOT NULL, {})",
            quote_ident(&self.table),
            quote_ident(&self.date_column),
            columns.join(", ")
        );
        self.lock()?.execute_batch(&sql)?;
        Ok(())
    }

    /// Append one row. Indices not listed in `values` are stored as NULL.
    pub fn insert_row(&self, date: &str, values: &[(IndexKey, f64)]) -> Result<()> {
        let mut columns = vec![quote_ident(&self.date_column)];
        let mut params: Vec<Value> = vec![Value::Text(date.to_string())];
        for (key, value) in values {
            columns.push(quote_ident(key.as_str()));
            params.push(Value::Real(*value));
        }
        let placeholders: Vec<String> = (1..=params.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table),
            columns.join(", "),
            placeholders.join(", ")
        );
        self.lock()?.execute(&sql, params_from_iter(params))?;
        Ok(())
    }

    /// Overwrite one cell. Returns the number of rows touched.
    pub fn update_value(&self, date: &str, key: IndexKey, value: f64) -> Result<usize> {
        let sql = format!(
            "UPDATE {} SET {} = ?1 WHERE {} = ?2",
            quote_ident(&self.table),
            quote_ident(key.as_str()),
            quote_ident(&self.date_column)
        );
        let changed = self.lock()?.execute(&sql, rusqlite::params![value, date])?;
        Ok(changed)
    }

    /// Read one index column in row order.
    pub fn read_series(&self, index: IndexKey) -> Result<IndexSeries> {
        let sql = format!(
            "SELECT {}, {} FROM {} ORDER BY rowid",
            quote_ident(&self.date_column),
            quote_ident(index.as_str()),
            quote_ident(&self.table)
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let points = stmt
            .query_map([], |row| {
                Ok(SeriesPoint {
                    date: render_value(row.get::<_, Value>(0)?),
                    value: render_value(row.get::<_, Value>(1)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        debug!(index = %index, points = points.len(), "read index series");
        Ok(IndexSeries { index, points })
    }

    /// Read every row of the table.
    pub fn read_all(&self) -> Result<Vec<IndexRow>> {
        let value_columns: Vec<String> = IndexKey::all()
            .iter()
            .map(|k| quote_ident(k.as_str()))
            .collect();
        let sql = format!(
            "SELECT rowid, {}, {} FROM {} ORDER BY rowid",
            quote_ident(&self.date_column),
            value_columns.join(", "),
            quote_ident(&self.table)
        );

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([], |row| {
                let mut values = Vec::with_capacity(IndexKey::COUNT);
                for (i, index) in IndexKey::all().iter().enumerate() {
                    values.push(IndexValue {
                        index: *index,
                        value: numeric_value(row.get::<_, Value>(i + 2)?),
                    });
                }
                Ok(IndexRow {
                    id: row.get(0)?,
                    date: render_value(row.get::<_, Value>(1)?),
                    values,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
    }

    /// [`read_series`](Self::read_series) on the blocking pool.
    pub async fn load_series(&self, index: IndexKey) -> Result<IndexSeries> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.read_series(index))
            .await
            .map_err(|e| IndexcastError::Other(anyhow!("store task failed: {e}")))?
    }

    /// [`read_all`](Self::read_all) on the blocking pool.
    pub async fn load_all(&self) -> Result<Vec<IndexRow>> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.read_all())
            .await
            .map_err(|e| IndexcastError::Other(anyhow!("store task failed: {e}")))?
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn render_value(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Integer(i) => i.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => s,
        Value::Blob(b) => String::from_utf8_lossy(&b).into_owned(),
    }
}

fn numeric_value(value: Value) -> Option<f64> {
    match value {
        Value::Integer(i) => Some(i as f64),
        Value::Real(f) => Some(f),
        Value::Text(s) => s.trim().parse().ok(),
        Value::Null | Value::Blob(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> IndexStore {
        let store = IndexStore::in_memory().unwrap();
        store
            .insert_row("2020-01-02", &[(IndexKey::Sp500, 3257.85), (IndexKey::GoldSpot, 1528.1)])
            .unwrap();
        store
            .insert_row("2020-01-03", &[(IndexKey::Sp500, 3234.85)])
            .unwrap();
        store
    }

    #[test]
    fn reads_one_column_with_special_characters_in_its_name() {
        let store = seeded();

        let sp = store.read_series(IndexKey::Sp500).unwrap();
        assert_eq!(
            sp.points,
            vec![
                SeriesPoint { date: "2020-01-02".into(), value: "3257.85".into() },
                SeriesPoint { date: "2020-01-03".into(), value: "3234.85".into() },
            ]
        );

        let gold = store.read_series(IndexKey::GoldSpot).unwrap();
        assert_eq!(gold.points[0].value, "1528.1");
        assert_eq!(gold.points[1].value, "");
    }

    #[test]
    fn read_all_returns_every_index_in_catalogue_order() {
        let store = seeded();
        let rows = store.read_all().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "2020-01-02");
        let indices: Vec<IndexKey> = rows[0].values.iter().map(|v| v.index).collect();
        assert_eq!(indices, IndexKey::ALL.to_vec());
        assert_eq!(rows[0].values[0].value, Some(3257.85));
        assert_eq!(rows[1].values[2].value, None);
    }

    #[test]
    fn update_changes_subsequent_reads() {
        let store = seeded();
        assert_eq!(store.update_value("2020-01-03", IndexKey::Sp500, 1.5).unwrap(), 1);
        let sp = store.read_series(IndexKey::Sp500).unwrap();
        assert_eq!(sp.points[1].value, "1.5");
    }

    #[test]
    fn missing_table_is_a_store_error() {
        let store = IndexStore::from_connection(
            Connection::open_in_memory().unwrap(),
            &StoreSection::default(),
        );
        assert!(matches!(
            store.read_series(IndexKey::MsciEm),
            Err(IndexcastError::StoreError(_))
        ));
    }
}
