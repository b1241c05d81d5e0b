//! SQLite mirror of the run artifacts.
//!
//! Every table has columns `(run_date, generated_at, payload)`. The three
//! watchlist tables hold one JSON row per record, `run_summary` one row per
//! run. Writing a run replaces any rows already stored for that date.

use crate::adapters::artifact_payload;
use crate::domain::error::PremarketError;
use crate::domain::pipeline::EngineOutput;
use crate::domain::summary::RunSummary;
use crate::ports::artifact_port::ArtifactPort;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use serde::Serialize;
use std::path::Path;

pub const TABLES: [&str; 4] = ["full_watchlist", "top_n", "watchlist", "run_summary"];

fn db_err(e: impl std::fmt::Display) -> PremarketError {
    PremarketError::Artifact {
        artifact: "sqlite".into(),
        reason: e.to_string(),
    }
}

fn json<T: Serialize>(value: &T) -> Result<String, PremarketError> {
    serde_json::to_string(value).map_err(db_err)
}

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteAdapter {
    pub fn open(path: &Path) -> Result<Self, PremarketError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let manager = SqliteConnectionManager::file(path);
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| db_err(e))?;
        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    pub fn in_memory() -> Result<Self, PremarketError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| db_err(e))?;
        let adapter = Self { pool };
        adapter.initialize_schema()?;
        Ok(adapter)
    }

    fn initialize_schema(&self) -> Result<(), PremarketError> {
        let conn = self.pool.get().map_err(db_err)?;
        for table in TABLES {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    run_date TEXT NOT NULL,
                    generated_at TEXT NOT NULL,
                    payload TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_{table}_run_date ON {table}(run_date);"
            ))
            .map_err(db_err)?;
        }
        Ok(())
    }

    /// Stored payloads for `table` on `run_date`, in insertion order.
    pub fn payloads(&self, table: &str, run_date: NaiveDate) -> Result<Vec<String>, PremarketError> {
        if !TABLES.contains(&table) {
            return Err(db_err(format!("unknown table {table}")));
        }
        let conn = self.pool.get().map_err(db_err)?;
        let mut stmt = conn
            .prepare(&format!("SELECT payload FROM {table} WHERE run_date = ?1 ORDER BY rowid"))
            .map_err(db_err)?;
        let rows = stmt
            .query_map(params![run_date.format("%Y-%m-%d").to_string()], |row| row.get(0))
            .map_err(db_err)?;
        rows.collect::<Result<Vec<String>, _>>().map_err(db_err)
    }

    pub fn row_count(&self, table: &str) -> Result<usize, PremarketError> {
        if !TABLES.contains(&table) {
            return Err(db_err(format!("unknown table {table}")));
        }
        let conn = self.pool.get().map_err(db_err)?;
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .map_err(db_err)?;
        Ok(count as usize)
    }
}

fn json_rows<T: Serialize>(records: &[T]) -> Result<Vec<String>, PremarketError> {
    records.iter().map(json).collect()
}

impl ArtifactPort for SqliteAdapter {
    fn write_run(&self, output: &EngineOutput, summary: &RunSummary) -> Result<(), PremarketError> {
        let tables: [(&str, Vec<String>); 4] = [
            (
                "full_watchlist",
                json_rows(&artifact_payload::full_watchlist(output, summary).rows)?,
            ),
            ("top_n", json_rows(&artifact_payload::top_n(output, summary).ranking)?),
            ("watchlist", json_rows(&artifact_payload::watchlist_rows(output))?),
            ("run_summary", vec![json(summary)?]),
        ];
        let run_date = output.run_date.format("%Y-%m-%d").to_string();

        let mut conn = self.pool.get().map_err(db_err)?;
        let tx = conn.transaction().map_err(db_err)?;
        for (table, payloads) in &tables {
            tx.execute(
                &format!("DELETE FROM {table} WHERE run_date = ?1"),
                params![run_date],
            )
            .map_err(db_err)?;
            let mut insert = tx
                .prepare(&format!(
                    "INSERT INTO {table} (run_date, generated_at, payload) VALUES (?1, ?2, ?3)"
                ))
                .map_err(db_err)?;
            for payload in payloads {
                insert
                    .execute(params![run_date, summary.generated_at, payload])
                    .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)?;

        tracing::info!(
            run_date,
            scored = output.scored.len(),
            selected = output.selection.selected.len(),
            "artifacts mirrored to sqlite"
        );
        Ok(())
    }
}
