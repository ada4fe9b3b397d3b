//! Database creation tests.

#[cfg(test)]
mod tests {
    use crate::fixtures::TestDatabase;
    use anyhow::Result;
    use insight_core::InsightError;
    use insight_sqlite::{ConnectionOptions, DatabaseSession};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn test_create_then_list_tables() -> Result<()> {
        let db = TestDatabase::empty()?;
        let session = DatabaseSession::create(db.path(), "t", ConnectionOptions::default())?;

        assert!(DatabaseSession::is_valid_database(db.path()));
        assert_eq!(DatabaseSession::list_tables(db.path())?, vec!["t"]);
        assert_eq!(session.table_name(), Some("t"));
        assert!(session.rows().is_empty());
        assert_eq!(session.list_columns()?, vec!["Key", "Value"]);
        Ok(())
    }

    #[test]
    fn test_create_replaces_existing_file() -> Result<()> {
        let db = TestDatabase::with_table(&[(1, "a"), (2, "b")])?;
        db.run_sql("CREATE TABLE other (x)")?;

        DatabaseSession::create(db.path(), "fresh", ConnectionOptions::default())?;
        assert_eq!(DatabaseSession::list_tables(db.path())?, vec!["fresh"]);
        Ok(())
    }

    #[test]
    fn test_create_makes_parent_directories() -> Result<()> {
        let db = TestDatabase::empty()?;
        let nested = db.dir().join("a").join("b").join("nested.db");

        let session = DatabaseSession::create(&nested, "t", ConnectionOptions::default())?;
        assert!(nested.exists());
        assert_eq!(session.path(), nested.as_path());
        Ok(())
    }

    #[rstest]
    #[case::spaces("my table")]
    #[case::quote("we\"ird")]
    #[case::keyword("select")]
    #[case::injection("t (x); DROP TABLE t; --")]
    #[case::trailing_space("t ")]
    #[case::sqlite_lookalike("sqlite1")]
    fn test_create_quotes_table_name(#[case] name: &str) -> Result<()> {
        let db = TestDatabase::empty()?;
        let mut session = DatabaseSession::create(db.path(), name, ConnectionOptions::default())?;

        assert_eq!(DatabaseSession::list_tables(db.path())?, vec![name]);
        assert_eq!(session.list_columns()?, vec!["Key", "Value"]);
        session.refresh()?;
        Ok(())
    }

    #[test]
    fn test_create_failure_removes_file() -> Result<()> {
        let db = TestDatabase::empty()?;

        // Names starting with "sqlite_" are reserved by the engine.
        let err = DatabaseSession::create(db.path(), "sqlite_reserved", ConnectionOptions::default())
            .unwrap_err();
        assert!(err.is_query(), "{:?}", err);
        assert!(!db.path().exists());
        Ok(())
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("   ")]
    fn test_create_rejects_empty_name(#[case] name: &str) -> Result<()> {
        let db = TestDatabase::with_table(&[(1, "a")])?;

        let err = DatabaseSession::create(db.path(), name, ConnectionOptions::default()).unwrap_err();
        assert!(matches!(err, InsightError::Configuration(_)));
        assert_eq!(db.count("t")?, 1, "existing file must be left alone");
        Ok(())
    }

    #[test]
    fn test_create_with_journal_mode() -> Result<()> {
        let db = TestDatabase::empty()?;
        let options = ConnectionOptions {
            foreign_keys: true,
            journal_mode: Some("TRUNCATE".into()),
        };

        let session = DatabaseSession::create(db.path(), "t", options)?;
        assert_eq!(session.file_info()?.journal_mode, "truncate");
        Ok(())
    }
}
