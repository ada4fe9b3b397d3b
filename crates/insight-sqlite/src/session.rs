//! Database session
//!
//! A `DatabaseSession` is the in-memory handle for one open database file and
//! its active table. It caches the active table's rows as strings and runs
//! user SQL against the file. Every operation opens its own connection and
//! drops it before returning.

use insight_core::{ColumnInfo, InsightError, Result, Row, Value};
use std::path::{Path, PathBuf};

use crate::connection::{
    ConnectionOptions, DatabaseFileInfo, SqliteConnection, expand_path, quote_identifier,
};

/// Title shown when no table is active
pub const APP_TITLE: &str = "SQLite-Insight";

/// Whether SQL text is routed as a row-returning query.
///
/// Only text that starts with `SELECT` after leading whitespace counts, in any
/// letter case.
pub fn is_select(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

/// An open database file plus the cached rows of its active table
#[derive(Debug)]
pub struct DatabaseSession {
    path: PathBuf,
    options: ConnectionOptions,
    table_name: Option<String>,
    rows: Vec<Row>,
    selection_mode: bool,
    last_result: Option<Vec<Row>>,
}

impl DatabaseSession {
    /// Check that `path` is an existing, readable SQLite database.
    ///
    /// Any failure along the way yields `false`.
    pub fn is_valid_database(path: &Path) -> bool {
        if !path.is_file() {
            tracing::debug!(path = %path.display(), "not a regular file");
            return false;
        }

        match SqliteConnection::open_read_only(path).and_then(|conn| conn.check_catalog()) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "database validation failed");
                false
            }
        }
    }

    /// Open an existing database and load its first table
    #[tracing::instrument(skip(path, options), fields(path = %path.display()))]
    pub fn open(path: &Path, options: ConnectionOptions) -> Result<Self> {
        let path = Self::validated_path(path)?;
        let table_name = SqliteConnection::open_read_only(&path)?
            .list_tables()?
            .into_iter()
            .next();

        if table_name.is_none() {
            tracing::info!("database has no tables");
        }

        let mut session = Self::new(path, options, table_name);
        session.load()?;
        Ok(session)
    }

    /// Open an existing database with a named table active
    #[tracing::instrument(skip(path, options), fields(path = %path.display()))]
    pub fn open_table(path: &Path, table: &str, options: ConnectionOptions) -> Result<Self> {
        let path = Self::validated_path(path)?;
        if !SqliteConnection::open_read_only(&path)?.table_exists(table)? {
            return Err(InsightError::NotFound(format!("Table '{}' not found", table)));
        }

        let mut session = Self::new(path, options, Some(table.to_string()));
        session.load()?;
        Ok(session)
    }

    /// Create a new database file holding a single `(Key INTEGER, Value TEXT)` table.
    ///
    /// The table name is used exactly as given; a blank name is rejected. Any
    /// existing file at `path` is replaced. If the table cannot be created the
    /// new file is removed again.
    #[tracing::instrument(skip(path, options), fields(path = %path.display()))]
    pub fn create(path: &Path, table_name: &str, options: ConnectionOptions) -> Result<Self> {
        if table_name.trim().is_empty() {
            return Err(InsightError::Configuration(
                "Table name must not be empty".into(),
            ));
        }

        let path = expand_path(path)?;
        if path.exists() {
            tracing::info!("replacing existing file");
            std::fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        let created = SqliteConnection::create(&path, &options).and_then(|conn| {
            conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (Key INTEGER, Value TEXT)",
                quote_identifier(table_name)
            ))
        });

        if let Err(e) = created {
            tracing::error!(error = %e, "table creation failed, removing new file");
            remove_database_files(&path);
            return Err(e);
        }

        tracing::info!(table = %table_name, "database created");
        let mut session = Self::new(path, options, Some(table_name.to_string()));
        session.load()?;
        Ok(session)
    }

    /// User table names of the file at `path`, in catalog order
    pub fn list_tables(path: &Path) -> Result<Vec<String>> {
        SqliteConnection::open_read_only(&expand_path(path)?)?.list_tables()
    }

    fn new(path: PathBuf, options: ConnectionOptions, table_name: Option<String>) -> Self {
        Self {
            path,
            options,
            table_name,
            rows: Vec::new(),
            selection_mode: false,
            last_result: None,
        }
    }

    fn validated_path(path: &Path) -> Result<PathBuf> {
        let path = expand_path(path)?;
        if !Self::is_valid_database(&path) {
            return Err(InsightError::InvalidDatabase(path.display().to_string()));
        }
        Ok(path)
    }

    fn connect(&self) -> Result<SqliteConnection> {
        SqliteConnection::open(&self.path, &self.options)
    }

    /// Column names of the active table in declaration order
    pub fn list_columns(&self) -> Result<Vec<String>> {
        Ok(self
            .describe_columns()?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Column metadata of the active table in declaration order
    pub fn describe_columns(&self) -> Result<Vec<ColumnInfo>> {
        match &self.table_name {
            Some(table) => self.connect()?.get_columns(table),
            None => Ok(Vec::new()),
        }
    }

    /// Re-read every row of the active table.
    ///
    /// Leaves selection mode. On failure the previous rows are kept.
    #[tracing::instrument(skip(self), fields(table = self.table_name.as_deref()))]
    pub fn load(&mut self) -> Result<()> {
        let rows = match &self.table_name {
            Some(table) => {
                self.connect()?
                    .query(&format!("SELECT * FROM {}", quote_identifier(table)), &[])?
                    .rows
            }
            None => Vec::new(),
        };

        tracing::debug!(row_count = rows.len(), "table loaded");
        self.rows = rows;
        self.selection_mode = false;
        Ok(())
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.load()
    }

    /// Make `table` the active table and load it
    pub fn select_table(&mut self, table: &str) -> Result<()> {
        if !self.connect()?.table_exists(table)? {
            return Err(InsightError::NotFound(format!("Table '{}' not found", table)));
        }

        let previous = self.table_name.replace(table.to_string());
        if let Err(e) = self.load() {
            self.table_name = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Run user SQL exactly as written.
    ///
    /// `SELECT` text returns the rows of its first statement and switches the
    /// session into selection mode; anything else runs as a non-query and
    /// returns `None`. Either way every statement in the text is run. Cached
    /// rows are not refreshed. On error the session is left as it was.
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn execute(&mut self, sql: &str) -> Result<Option<Vec<Row>>> {
        let conn = self.connect()?;

        if is_select(sql) {
            let rows = conn.query_batch(sql)?.rows;
            self.last_result = Some(rows.clone());
            self.selection_mode = true;
            Ok(Some(rows))
        } else {
            let changes = conn.execute_batch(sql)?;
            tracing::info!(changes, "non-query executed");
            self.selection_mode = false;
            Ok(None)
        }
    }

    /// Delete rows of the active table whose `key_column` equals `key_value`.
    ///
    /// Returns the number of rows deleted. Cached rows are not refreshed.
    pub fn delete_row(&self, key_column: &str, key_value: &Value) -> Result<u64> {
        let table = self
            .table_name
            .as_deref()
            .ok_or_else(|| InsightError::Schema("No active table".into()))?;

        let conn = self.connect()?;
        if !conn.get_columns(table)?.iter().any(|c| c.name == key_column) {
            return Err(InsightError::NotFound(format!(
                "Column '{}' not found in table '{}'",
                key_column, table
            )));
        }

        let affected = conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                quote_identifier(table),
                quote_identifier(key_column)
            ),
            std::slice::from_ref(key_value),
        )?;

        tracing::info!(table = %table, affected, "rows deleted");
        Ok(affected)
    }

    /// Page, encoding and journal information for the file
    pub fn file_info(&self) -> Result<DatabaseFileInfo> {
        self.connect()?.get_info()
    }

    /// Rows the grid should show: the last query result in selection mode,
    /// the active table otherwise
    pub fn displayed_rows(&self) -> &[Row] {
        match (&self.last_result, self.selection_mode) {
            (Some(result), true) => result,
            _ => &self.rows,
        }
    }

    pub fn title(&self) -> String {
        match &self.table_name {
            Some(table) => format!("{} - {}", table, APP_TITLE),
            None => APP_TITLE.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table_name(&self) -> Option<&str> {
        self.table_name.as_deref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn is_selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn last_result(&self) -> Option<&[Row]> {
        self.last_result.as_deref()
    }
}

/// Remove a database file and any journal files next to it, ignoring errors
fn remove_database_files(path: &Path) {
    for suffix in ["", "-journal", "-wal", "-shm"] {
        let mut name = path.as_os_str().to_os_string();
        name.push(suffix);
        let candidate = PathBuf::from(name);
        if candidate.exists()
            && let Err(e) = std::fs::remove_file(&candidate)
        {
            tracing::warn!(path = %candidate.display(), error = %e, "failed to remove file");
        }
    }
}
