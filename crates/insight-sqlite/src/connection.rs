//! SQLite connection wrapper
//!
//! A `SqliteConnection` lives for exactly one session operation: it is opened,
//! used and dropped inside the call. Nothing here is pooled or shared.

use insight_core::{ColumnInfo, InsightConfig, InsightError, Result, Row, Value};
use rusqlite::{Batch, Connection as RusqliteConnection, OpenFlags, Params, Statement, params_from_iter};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Per-connection settings applied right after open
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionOptions {
    pub foreign_keys: bool,
    pub journal_mode: Option<String>,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            foreign_keys: true,
            journal_mode: None,
        }
    }
}

impl From<&InsightConfig> for ConnectionOptions {
    fn from(config: &InsightConfig) -> Self {
        Self {
            foreign_keys: config.foreign_keys,
            journal_mode: config.journal_mode.clone(),
        }
    }
}

/// Rows buffered from a query, with the statement's column names
#[derive(Debug, Clone, Default)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// Information about the SQLite database file
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseFileInfo {
    pub file_size_bytes: i64,
    pub page_count: usize,
    pub page_size: usize,
    pub encoding: String,
    pub journal_mode: String,
    pub foreign_keys_enabled: bool,
}

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: RusqliteConnection,
}

impl SqliteConnection {
    /// Open an existing database file for reading and writing
    pub fn open(path: &Path, options: &ConnectionOptions) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Self::open_with_flags(path, flags, options)
    }

    /// Open a database file, creating it if it does not exist
    pub fn create(path: &Path, options: &ConnectionOptions) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        Self::open_with_flags(path, flags, options)
    }

    /// Open a database file without write access and without applying pragmas
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
            InsightError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                path.display(),
                e
            ))
        })?;
        Ok(Self { conn })
    }

    fn open_with_flags(path: &Path, flags: OpenFlags, options: &ConnectionOptions) -> Result<Self> {
        tracing::debug!(path = %path.display(), "opening SQLite database");

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            return Err(InsightError::Connection(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }

        let conn = RusqliteConnection::open_with_flags(path, flags).map_err(|e| {
            InsightError::Connection(format!(
                "Failed to open SQLite database at '{}': {}",
                path.display(),
                e
            ))
        })?;

        if options.foreign_keys {
            conn.pragma_update(None, "foreign_keys", "ON").map_err(|e| {
                InsightError::Connection(format!("Failed to enable foreign keys: {}", e))
            })?;
        }

        if let Some(mode) = &options.journal_mode {
            conn.pragma_update(None, "journal_mode", mode)
                .map_err(|e| InsightError::Connection(format!("Failed to set journal mode: {}", e)))?;
        }

        Ok(Self { conn })
    }

    /// Read the catalog. Fails if the file is not a SQLite database.
    pub fn check_catalog(&self) -> Result<()> {
        self.conn
            .query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|_| ())
            .map_err(|e| InsightError::InvalidDatabase(e.to_string()))
    }

    /// Execute a query and buffer every row, stringifying each cell
    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryOutput> {
        let start_time = std::time::Instant::now();
        let rusqlite_params = values_to_rusqlite(params);

        let mut stmt = self
            .conn
            .prepare(sql)
            .map_err(|e| InsightError::Query(e.to_string()))?;
        let output = buffer_rows(&mut stmt, params_from_iter(rusqlite_params.iter()))?;

        tracing::debug!(
            row_count = output.rows.len(),
            execution_time_ms = start_time.elapsed().as_millis() as u64,
            "query executed successfully"
        );
        Ok(output)
    }

    /// Run SQL text that may hold several statements, buffering the rows of
    /// the first one.
    ///
    /// Every later statement still runs to completion; rows it produces are
    /// discarded. The first failing statement stops the batch and its error
    /// is returned.
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn query_batch(&self, sql: &str) -> Result<QueryOutput> {
        let mut batch = Batch::new(&self.conn, sql);
        let mut output: Option<QueryOutput> = None;
        let mut statements = 0usize;

        while let Some(mut stmt) = batch
            .next()
            .map_err(|e| InsightError::Query(e.to_string()))?
        {
            statements += 1;
            if output.is_none() {
                output = Some(buffer_rows(&mut stmt, [])?);
                continue;
            }

            let mut rows = stmt
                .query([])
                .map_err(|e| InsightError::Query(e.to_string()))?;
            while rows
                .next()
                .map_err(|e| InsightError::Query(e.to_string()))?
                .is_some()
            {}
        }

        let output = output.unwrap_or_default();
        tracing::debug!(statements, row_count = output.rows.len(), "batch query executed");
        Ok(output)
    }

    /// Execute a single parameterized statement, returning the affected row count
    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        let rusqlite_params = values_to_rusqlite(params);

        let rows_affected = self
            .conn
            .execute(sql, params_from_iter(rusqlite_params.iter()))
            .map_err(|e| InsightError::Query(e.to_string()))?;

        tracing::debug!(affected_rows = rows_affected, "statement executed");
        Ok(rows_affected as u64)
    }

    /// Execute SQL text that may hold several statements.
    ///
    /// Returns the row count changed by the last statement.
    #[tracing::instrument(skip(self, sql), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    pub fn execute_batch(&self, sql: &str) -> Result<u64> {
        self.conn
            .execute_batch(sql)
            .map_err(|e| InsightError::Query(e.to_string()))?;

        let changes = self.conn.changes() as u64;
        tracing::debug!(changes, "batch executed");
        Ok(changes)
    }

    /// User table names in catalog scan order
    pub fn list_tables(&self) -> Result<Vec<String>> {
        tracing::debug!("listing tables from sqlite_master");
        let output = self.query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND substr(name, 1, 7) <> 'sqlite_'",
            &[],
        )?;

        let tables: Vec<String> = output
            .rows
            .iter()
            .filter_map(|row| row.get("name").map(str::to_string))
            .collect();

        tracing::debug!(table_count = tables.len(), "tables listed");
        Ok(tables)
    }

    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let output = self.query(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1",
            &[Value::from(table)],
        )?;
        Ok(!output.rows.is_empty())
    }

    /// Column metadata in declaration order
    pub fn get_columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        tracing::trace!(table = %table, "fetching column information");
        let mut stmt = self
            .conn
            .prepare("SELECT cid, name, type, \"notnull\", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid")
            .map_err(|e| InsightError::Schema(e.to_string()))?;

        let columns = stmt
            .query_map([table], |row| {
                let ordinal: i64 = row.get(0)?;
                let not_null: i64 = row.get(3)?;
                let default_value: Option<String> = row.get(4)?;
                let pk: i64 = row.get(5)?;
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    ordinal: ordinal as usize,
                    data_type: row.get(2)?,
                    nullable: not_null == 0,
                    default_value,
                    is_primary_key: pk > 0,
                })
            })
            .map_err(|e| InsightError::Schema(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| InsightError::Schema(e.to_string()))?;

        Ok(columns)
    }

    /// Get database file information
    pub fn get_info(&self) -> Result<DatabaseFileInfo> {
        let page_count: i64 = self.pragma("page_count")?;
        let page_size: i64 = self.pragma("page_size")?;
        let encoding: String = self.pragma("encoding")?;
        let journal_mode: String = self.pragma("journal_mode")?;
        let foreign_keys: i64 = self.pragma("foreign_keys")?;

        Ok(DatabaseFileInfo {
            file_size_bytes: page_count * page_size,
            page_count: page_count as usize,
            page_size: page_size as usize,
            encoding,
            journal_mode,
            foreign_keys_enabled: foreign_keys != 0,
        })
    }

    fn pragma<T: rusqlite::types::FromSql>(&self, name: &str) -> Result<T> {
        self.conn
            .pragma_query_value(None, name, |row| row.get(0))
            .map_err(|e| InsightError::Query(e.to_string()))
    }
}

/// Quote an identifier for interpolation into SQL text
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Expand `~/` to the home directory and make relative paths absolute
pub fn expand_path(path: &Path) -> Result<PathBuf> {
    let expanded = match path.to_str().and_then(|s| s.strip_prefix("~/")) {
        Some(rest) => {
            let home = std::env::var_os("HOME").ok_or_else(|| {
                InsightError::Configuration("Unable to determine HOME directory".into())
            })?;
            PathBuf::from(home).join(rest)
        }
        None => path.to_path_buf(),
    };

    if expanded.is_relative() {
        Ok(std::env::current_dir()?.join(expanded))
    } else {
        Ok(expanded)
    }
}

fn values_to_rusqlite(values: &[Value]) -> Vec<rusqlite::types::Value> {
    values.iter().map(value_to_rusqlite).collect()
}

fn value_to_rusqlite(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Integer(i) => rusqlite::types::Value::Integer(*i),
        Value::Real(f) => rusqlite::types::Value::Real(*f),
        Value::Text(s) => rusqlite::types::Value::Text(s.clone()),
        Value::Blob(b) => rusqlite::types::Value::Blob(b.clone()),
    }
}

/// Step a prepared statement to the end, stringifying every cell
fn buffer_rows<P: Params>(stmt: &mut Statement<'_>, params: P) -> Result<QueryOutput> {
    let columns: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    let mut query_rows = stmt
        .query(params)
        .map_err(|e| InsightError::Query(e.to_string()))?;

    while let Some(row) = query_rows
        .next()
        .map_err(|e| InsightError::Query(e.to_string()))?
    {
        let mut out = Row::new();
        for (i, name) in columns.iter().enumerate() {
            out.insert(name.as_str(), &rusqlite_to_value(row, i)?);
        }
        rows.push(out);
    }

    Ok(QueryOutput { columns, rows })
}

fn rusqlite_to_value(row: &rusqlite::Row, idx: usize) -> Result<Value> {
    use rusqlite::types::ValueRef;

    let value_ref = row
        .get_ref(idx)
        .map_err(|e| InsightError::Query(e.to_string()))?;

    Ok(match value_ref {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(s) => Value::Text(String::from_utf8_lossy(s).to_string()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scratch() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = SqliteConnection::create(&dir.path().join("scratch.db"), &ConnectionOptions::default())
            .unwrap();
        (dir, conn)
    }

    #[test]
    fn test_query_stringifies_every_type() {
        let (_dir, conn) = scratch();
        let output = conn
            .query(
                "SELECT 1 AS i, 2.5 AS r, 'txt' AS t, NULL AS n, x'00ff' AS b",
                &[],
            )
            .unwrap();

        assert_eq!(output.columns, vec!["i", "r", "t", "n", "b"]);
        let row = &output.rows[0];
        assert_eq!(row.get("i"), Some("1"));
        assert_eq!(row.get("r"), Some("2.5"));
        assert_eq!(row.get("t"), Some("txt"));
        assert_eq!(row.get("n"), Some(""));
        assert_eq!(row.get("b"), Some("<2 bytes>"));
    }

    #[test]
    fn test_execute_binds_parameters() {
        let (_dir, conn) = scratch();
        conn.execute_batch("CREATE TABLE t (Key INTEGER, Value TEXT)").unwrap();
        let affected = conn
            .execute(
                "INSERT INTO t (Key, Value) VALUES (?1, ?2)",
                &[Value::Integer(1), Value::from("it's")],
            )
            .unwrap();
        assert_eq!(affected, 1);

        let output = conn.query("SELECT Value FROM t", &[]).unwrap();
        assert_eq!(output.rows[0].get("Value"), Some("it's"));
    }

    #[test]
    fn test_execute_batch_reports_last_changes() {
        let (_dir, conn) = scratch();
        let changes = conn
            .execute_batch(
                "CREATE TABLE t (Key INTEGER); INSERT INTO t VALUES (1); INSERT INTO t VALUES (2), (3);",
            )
            .unwrap();
        assert_eq!(changes, 2);
    }

    #[test]
    fn test_list_tables_hides_internal_tables() {
        let (_dir, conn) = scratch();
        conn.execute_batch(
            "CREATE TABLE b (id INTEGER PRIMARY KEY AUTOINCREMENT); CREATE TABLE a (x);",
        )
        .unwrap();
        assert_eq!(conn.list_tables().unwrap(), vec!["b", "a"]);
        assert!(conn.table_exists("a").unwrap());
        assert!(!conn.table_exists("sqlite_sequence_missing").unwrap());
    }

    #[test]
    fn test_list_tables_keeps_sqlite_lookalike_names() {
        let (_dir, conn) = scratch();
        conn.execute_batch(
            "CREATE TABLE sqlite1 (x); CREATE TABLE SQLiteData (y); CREATE TABLE c (id INTEGER PRIMARY KEY AUTOINCREMENT);",
        )
        .unwrap();
        assert_eq!(conn.list_tables().unwrap(), vec!["sqlite1", "SQLiteData", "c"]);
    }

    #[test]
    fn test_query_batch_runs_trailing_statements() {
        let (_dir, conn) = scratch();
        conn.execute_batch("CREATE TABLE t (Key INTEGER); INSERT INTO t VALUES (1), (2);")
            .unwrap();

        let output = conn
            .query_batch("SELECT Key FROM t ORDER BY Key; DELETE FROM t WHERE Key = 1; SELECT 99 AS ignored;")
            .unwrap();
        assert_eq!(output.columns, vec!["Key"]);
        assert_eq!(output.rows.len(), 2);

        let remaining = conn.query("SELECT Key FROM t", &[]).unwrap();
        assert_eq!(remaining.rows.len(), 1);
        assert_eq!(remaining.rows[0].get("Key"), Some("2"));
    }

    #[test]
    fn test_query_batch_surfaces_trailing_error() {
        let (_dir, conn) = scratch();
        let err = conn.query_batch("SELECT 1; garbage garbage").unwrap_err();
        assert!(err.is_query(), "{:?}", err);
    }

    #[test]
    fn test_get_columns_in_declaration_order() {
        let (_dir, conn) = scratch();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL DEFAULT 'x', misc)")
            .unwrap();

        let columns = conn.get_columns("t").unwrap();
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "misc"]);
        assert!(columns[0].is_primary_key);
        assert!(!columns[1].nullable);
        assert_eq!(columns[1].default_value.as_deref(), Some("'x'"));
        assert_eq!(columns[2].data_type, "");
    }

    #[test]
    fn test_get_info_reports_pragmas() {
        let (_dir, conn) = scratch();
        conn.execute_batch("CREATE TABLE t (x)").unwrap();
        let info = conn.get_info().unwrap();
        assert!(info.page_count >= 1);
        assert_eq!(info.file_size_bytes, (info.page_count * info.page_size) as i64);
        assert_eq!(info.encoding, "UTF-8");
        assert!(info.foreign_keys_enabled);
    }

    #[test]
    fn test_quote_identifier_escapes_quotes() {
        assert_eq!(quote_identifier("t"), "\"t\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_open_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = SqliteConnection::open(&dir.path().join("absent.db"), &ConnectionOptions::default());
        assert!(matches!(err, Err(InsightError::Connection(_))));
    }

    #[test]
    fn test_expand_relative_path() {
        let expanded = expand_path(Path::new("data.db")).unwrap();
        assert!(expanded.is_absolute());
        assert!(expanded.ends_with("data.db"));
    }
}
