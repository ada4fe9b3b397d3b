//! Test fixtures for session tests.
//!
//! Each `TestDatabase` owns a temporary directory that is removed when the
//! fixture is dropped, so tests never share files.

use anyhow::{Context, Result};
use insight_core::Row;
use insight_sqlite::{ConnectionOptions, DatabaseSession, SqliteConnection};
use once_cell::sync::Lazy;
use rstest::fixture;
use std::path::{Path, PathBuf};

/// Table created by `TestDatabase::with_table`
pub const TEST_TABLE: &str = "t";

static LOGGING: Lazy<()> = Lazy::new(|| {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
});

/// Initialize logging for tests if not already initialized
pub fn initialize_logging() {
    Lazy::force(&LOGGING);
}

/// A database file in its own temporary directory
pub struct TestDatabase {
    dir: tempfile::TempDir,
    path: PathBuf,
}

impl TestDatabase {
    /// A directory with no database file in it yet
    pub fn empty() -> Result<Self> {
        initialize_logging();
        let dir = tempfile::tempdir().context("failed to create temp directory")?;
        let path = dir.path().join("test.db");
        Ok(Self { dir, path })
    }

    /// A database holding `TEST_TABLE (Key INTEGER, Value TEXT)` with the given rows
    pub fn with_table(rows: &[(i64, &str)]) -> Result<Self> {
        let db = Self::empty()?;
        db.run_sql("CREATE TABLE t (Key INTEGER, Value TEXT)")?;
        for (key, value) in rows {
            db.run_sql(&format!(
                "INSERT INTO t (Key, Value) VALUES ({}, '{}')",
                key,
                value.replace('\'', "''")
            ))?;
        }
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Run SQL directly against the file, outside any session
    pub fn run_sql(&self, sql: &str) -> Result<()> {
        let conn = SqliteConnection::create(&self.path, &ConnectionOptions::default())?;
        conn.execute_batch(sql)
            .with_context(|| format!("failed to run fixture SQL: {}", sql))?;
        Ok(())
    }

    /// Row count of a table, read directly from the file
    pub fn count(&self, table: &str) -> Result<usize> {
        let conn = SqliteConnection::open_read_only(&self.path)?;
        let output = conn.query(&format!("SELECT COUNT(*) AS n FROM \"{}\"", table), &[])?;
        output
            .rows
            .first()
            .and_then(|row| row.get("n"))
            .context("count returned no rows")?
            .parse()
            .context("count is not a number")
    }

    pub fn open(&self) -> Result<DatabaseSession> {
        Ok(DatabaseSession::open(&self.path, ConnectionOptions::default())?)
    }
}

/// Build a row from `(column, value)` pairs
pub fn row(cells: &[(&str, &str)]) -> Row {
    cells.iter().copied().collect()
}

/// Session over a fresh `t` table with two rows
#[fixture]
pub fn seeded() -> (TestDatabase, DatabaseSession) {
    let db = TestDatabase::with_table(&[(1, "a"), (2, "b")]).expect("fixture database");
    let session = db.open().expect("fixture session");
    (db, session)
}
