//! Starter statements for the query editor
//!
//! Each template is filled with the active table and its columns. Without a
//! session, or when the session has no active table, a generic sample is
//! returned instead.

use insight_core::{InsightError, Result};
use std::str::FromStr;

use crate::{DatabaseSession, quote_identifier};

/// Kind of starter statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTemplate {
    Insert,
    Select,
    Delete,
}

impl QueryTemplate {
    pub const ALL: [QueryTemplate; 3] = [Self::Insert, Self::Select, Self::Delete];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Select => "select",
            Self::Delete => "delete",
        }
    }

    /// Generic statement used when no table is available
    pub fn sample(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT INTO table_name () VALUES ();",
            Self::Select => "SELECT () FROM table_name;",
            Self::Delete => "DELETE FROM table_name WHERE condition;",
        }
    }

    /// Fill the template for `table` with `columns`
    pub fn fill(&self, table: &str, columns: &[String]) -> String {
        let table = identifier(table);
        let columns = columns
            .iter()
            .map(|c| identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        match self {
            Self::Insert => format!("INSERT INTO {} ({}) VALUES (  );", table, columns),
            Self::Select => format!("SELECT {} FROM {};", columns, table),
            Self::Delete => format!("DELETE FROM {} WHERE (  );", table),
        }
    }

    /// Render for an optional open session
    pub fn render(&self, session: Option<&DatabaseSession>) -> Result<String> {
        match session.and_then(|s| s.table_name().map(|t| (s, t))) {
            Some((session, table)) => {
                let columns = match self {
                    Self::Delete => Vec::new(),
                    _ => session.list_columns()?,
                };
                Ok(self.fill(table, &columns))
            }
            None => Ok(self.sample().to_string()),
        }
    }
}

impl FromStr for QueryTemplate {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                InsightError::NotFound(format!(
                    "Unknown template '{}', expected insert, select or delete",
                    s
                ))
            })
    }
}

/// Keywords SQLite will not accept as a bare identifier, plus the
/// `CURRENT_*` names that parse as time functions instead of columns
const RESERVED: &[&str] = &[
    "ADD", "ALL", "ALTER", "AND", "AS", "AUTOINCREMENT", "BETWEEN", "CASE", "CHECK", "COLLATE",
    "COMMIT", "CONSTRAINT", "CREATE", "CROSS", "CURRENT_DATE", "CURRENT_TIME",
    "CURRENT_TIMESTAMP", "DEFAULT", "DEFERRABLE", "DELETE", "DISTINCT", "DROP", "ELSE", "ESCAPE",
    "EXCEPT", "EXISTS", "FILTER", "FOREIGN", "FROM", "FULL", "GROUP", "HAVING", "IN", "INDEX",
    "INDEXED", "INNER", "INSERT", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN", "LEFT", "LIMIT",
    "NATURAL", "NOT", "NOTHING", "NOTNULL", "NULL", "ON", "OR", "ORDER", "OUTER", "OVER",
    "PRIMARY", "REFERENCES", "RETURNING", "RIGHT", "ROLLBACK", "SELECT", "SET", "TABLE",
    "TEMPORARY", "THEN", "TO", "TRANSACTION", "UNION", "UNIQUE", "UPDATE", "USING", "VALUES",
    "WHEN", "WHERE", "WINDOW",
];

/// Leave plain, unreserved identifiers bare, quote everything else
fn identifier(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED.iter().any(|word| word.eq_ignore_ascii_case(name));

    if plain {
        name.to_string()
    } else {
        quote_identifier(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fill_templates() {
        let columns = cols(&["Key", "Value"]);
        assert_eq!(
            QueryTemplate::Insert.fill("t", &columns),
            "INSERT INTO t (Key, Value) VALUES (  );"
        );
        assert_eq!(
            QueryTemplate::Select.fill("t", &columns),
            "SELECT Key, Value FROM t;"
        );
        assert_eq!(
            QueryTemplate::Delete.fill("t", &columns),
            "DELETE FROM t WHERE (  );"
        );
    }

    #[test]
    fn test_fill_quotes_unusual_names() {
        let columns = cols(&["first name", "ok_1"]);
        assert_eq!(
            QueryTemplate::Select.fill("my table", &columns),
            "SELECT \"first name\", ok_1 FROM \"my table\";"
        );
        assert_eq!(identifier("1abc"), "\"1abc\"");
    }

    #[test]
    fn test_fill_quotes_reserved_words() {
        let columns = cols(&["order", "Group", "Key", "current_date"]);
        assert_eq!(
            QueryTemplate::Select.fill("values", &columns),
            "SELECT \"order\", \"Group\", Key, \"current_date\" FROM \"values\";"
        );
    }

    #[test]
    fn test_samples_without_session() {
        assert_eq!(
            QueryTemplate::Insert.render(None).unwrap(),
            "INSERT INTO table_name () VALUES ();"
        );
        assert_eq!(
            QueryTemplate::Select.render(None).unwrap(),
            "SELECT () FROM table_name;"
        );
        assert_eq!(
            QueryTemplate::Delete.render(None).unwrap(),
            "DELETE FROM table_name WHERE condition;"
        );
    }

    #[test]
    fn test_parse_template_kind() {
        assert_eq!("INSERT".parse::<QueryTemplate>().unwrap(), QueryTemplate::Insert);
        assert_eq!(" select ".parse::<QueryTemplate>().unwrap(), QueryTemplate::Select);
        assert!("update".parse::<QueryTemplate>().is_err());
    }
}
