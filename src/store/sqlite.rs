//! SQLite-backed observation store

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::SEED_OBSERVATIONS;
use crate::error::{Result, ServiceError};
use crate::types::{Field, ListOrder, NewObservation, Observation};

/// SQLite-based observation store
#[derive(Clone)]
pub struct SqliteObservationStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteObservationStore {
    /// Open (or create) a store at the given path
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    ServiceError::Internal(format!(
                        "failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::init_schema(&conn)?;

        debug!("Opened observation store at {}", path.display());

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open a private in-memory store
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS observations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                years REAL NOT NULL,
                job_level INTEGER NOT NULL,
                salary REAL NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_observations_years ON observations(years);
        "#,
        )?;
        Ok(())
    }

    /// Append a new observation, returning it with its assigned id
    pub async fn add(&self, obs: NewObservation) -> Result<Observation> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT INTO observations (years, job_level, salary) VALUES (?1, ?2, ?3)",
            params![obs.years, obs.job_level, obs.salary],
        )?;

        Ok(Observation {
            id: conn.last_insert_rowid(),
            years: obs.years,
            job_level: obs.job_level,
            salary: obs.salary,
        })
    }

    /// Remove one observation
    pub async fn delete(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM observations WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(ServiceError::NotFound(id));
        }
        Ok(())
    }

    /// Remove every observation, returning how many there were
    pub async fn delete_all(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM observations", [])?;
        Ok(removed)
    }

    /// Replace the whole table with the canonical seed set
    pub async fn reset(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM observations", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO observations (years, job_level, salary) VALUES (?1, ?2, ?3)",
            )?;
            for &(years, job_level, salary) in SEED_OBSERVATIONS {
                stmt.execute(params![years, job_level, salary])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// List observations
    pub async fn list(&self, order: ListOrder) -> Result<Vec<Observation>> {
        let sql = match order {
            ListOrder::None => "SELECT id, years, job_level, salary FROM observations ORDER BY id",
            ListOrder::Years => {
                "SELECT id, years, job_level, salary FROM observations ORDER BY years, id"
            }
        };

        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map([], row_to_observation)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Number of stored observations
    pub async fn count(&self) -> Result<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Mean of a numeric column; `0.0` when the table is empty
    pub async fn average(&self, field: Field) -> Result<f64> {
        let sql = format!("SELECT AVG({}) FROM observations", field.column());
        let conn = self.conn.lock().await;
        let avg: Option<f64> = conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(avg.unwrap_or(0.0))
    }
}

fn row_to_observation(row: &rusqlite::Row<'_>) -> rusqlite::Result<Observation> {
    Ok(Observation {
        id: row.get(0)?,
        years: row.get(1)?,
        job_level: row.get(2)?,
        salary: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn obs(years: f64, job_level: i64, salary: f64) -> NewObservation {
        NewObservation::new(years, job_level, salary).unwrap()
    }

    #[tokio::test]
    async fn test_add_assigns_unique_ids() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        let a = store.add(obs(1.0, 1, 100.0)).await.unwrap();
        let b = store.add(obs(2.0, 2, 200.0)).await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.list(ListOrder::None).await.unwrap(), vec![a, b]);
    }

    #[tokio::test]
    async fn test_delete_missing_id_keeps_rows() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        store.add(obs(1.0, 1, 100.0)).await.unwrap();

        let err = store.delete(9999).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(9999)));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_delete_existing() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        let a = store.add(obs(1.0, 1, 100.0)).await.unwrap();
        store.delete(a.id).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);
        assert!(store.list(ListOrder::None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_all_returns_prior_count() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 0);

        store.reset().await.unwrap();
        assert_eq!(store.delete_all().await.unwrap(), 7);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_is_idempotent() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        store.add(obs(42.0, 3, 1.0)).await.unwrap();

        for _ in 0..2 {
            store.reset().await.unwrap();
            let rows = store.list(ListOrder::None).await.unwrap();
            let values: Vec<(f64, i64, f64)> =
                rows.iter().map(|o| (o.years, o.job_level, o.salary)).collect();
            assert_eq!(values, SEED_OBSERVATIONS.to_vec());
            assert_eq!(store.count().await.unwrap(), 7);
        }
    }

    #[tokio::test]
    async fn test_average_on_empty_is_zero() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        assert_eq!(store.average(Field::Salary).await.unwrap(), 0.0);
        assert_eq!(store.average(Field::Years).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_average() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        store.add(obs(1.0, 1, 100.0)).await.unwrap();
        store.add(obs(3.0, 3, 300.0)).await.unwrap();

        assert_eq!(store.average(Field::Years).await.unwrap(), 2.0);
        assert_eq!(store.average(Field::JobLevel).await.unwrap(), 2.0);
        assert_eq!(store.average(Field::Salary).await.unwrap(), 200.0);
    }

    #[tokio::test]
    async fn test_list_ordered_by_years() {
        let store = SqliteObservationStore::open_in_memory().unwrap();
        store.add(obs(5.0, 1, 1.0)).await.unwrap();
        store.add(obs(1.0, 1, 1.0)).await.unwrap();
        store.add(obs(3.0, 1, 1.0)).await.unwrap();

        let years: Vec<f64> = store
            .list(ListOrder::Years)
            .await
            .unwrap()
            .iter()
            .map(|o| o.years)
            .collect();
        assert_eq!(years, vec![1.0, 3.0, 5.0]);

        let inserted: Vec<f64> = store
            .list(ListOrder::None)
            .await
            .unwrap()
            .iter()
            .map(|o| o.years)
            .collect();
        assert_eq!(inserted, vec![5.0, 1.0, 3.0]);
    }

    #[tokio::test]
    async fn test_persists_to_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("salary.db");

        {
            let store = SqliteObservationStore::new(&path).await.unwrap();
            store.add(obs(2.0, 3, 600000.0)).await.unwrap();
        }

        let store = SqliteObservationStore::new(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 1);
    }
}
