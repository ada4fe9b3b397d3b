//! Grid column model
//!
//! The displayed columns come from the keys of the first row. With no rows
//! the caller supplies the table's declared columns instead.

use insight_core::Row;

/// A grid header and whether it is shown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridColumn {
    pub header: String,
    pub visible: bool,
}

impl GridColumn {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            visible: true,
        }
    }
}

/// Ordered set of grid columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GridColumns {
    columns: Vec<GridColumn>,
}

impl GridColumns {
    pub fn iter(&self) -> impl Iterator<Item = &GridColumn> {
        self.columns.iter()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Show or hide a column. Returns false if no column has that header.
    pub fn set_visible(&mut self, header: &str, visible: bool) -> bool {
        match self.columns.iter_mut().find(|c| c.header == header) {
            Some(column) => {
                column.visible = visible;
                true
            }
            None => false,
        }
    }

    pub fn visible_headers(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.visible)
            .map(|c| c.header.as_str())
            .collect()
    }

    /// Carry visibility flags over from a previous column set, by header
    pub fn inherit_visibility(&mut self, previous: &GridColumns) {
        for column in &mut self.columns {
            if let Some(old) = previous.columns.iter().find(|c| c.header == column.header) {
                column.visible = old.visible;
            }
        }
    }
}

/// Derive grid columns from the first row, falling back to `fallback`
pub fn grid_columns(rows: &[Row], fallback: &[String]) -> GridColumns {
    let columns = match rows.first() {
        Some(row) => row.columns().map(GridColumn::new).collect(),
        None => fallback.iter().map(GridColumn::new).collect(),
    };
    GridColumns { columns }
}

/// Visible cells of `row` in header order; missing cells are empty
pub fn project<'a>(row: &'a Row, columns: &GridColumns) -> Vec<&'a str> {
    columns
        .iter()
        .filter(|c| c.visible)
        .map(|c| row.get(&c.header).unwrap_or(""))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[(&str, &str)]) -> Row {
        cells.iter().copied().collect()
    }

    #[test]
    fn test_columns_from_first_row() {
        let rows = vec![row(&[("Key", "1"), ("Value", "a")])];
        let columns = grid_columns(&rows, &["ignored".to_string()]);
        assert_eq!(columns.visible_headers(), vec!["Key", "Value"]);
    }

    #[test]
    fn test_columns_fall_back_when_empty() {
        let fallback = vec!["id".to_string(), "name".to_string()];
        let columns = grid_columns(&[], &fallback);
        assert_eq!(columns.len(), 2);
        assert_eq!(columns.visible_headers(), vec!["id", "name"]);
    }

    #[test]
    fn test_hidden_columns_are_projected_out() {
        let r = row(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let mut columns = grid_columns(std::slice::from_ref(&r), &[]);

        assert!(columns.set_visible("b", false));
        assert!(!columns.set_visible("zzz", false));
        assert_eq!(columns.visible_headers(), vec!["a", "c"]);
        assert_eq!(project(&r, &columns), vec!["1", "3"]);
    }

    #[test]
    fn test_project_missing_cell_is_empty() {
        let first = row(&[("a", "1"), ("b", "2")]);
        let other = row(&[("a", "9")]);
        let columns = grid_columns(&[first], &[]);
        assert_eq!(project(&other, &columns), vec!["9", ""]);
    }

    #[test]
    fn test_inherit_visibility_by_header() {
        let mut old = grid_columns(&[], &["a".to_string(), "b".to_string()]);
        old.set_visible("b", false);

        let mut new = grid_columns(&[], &["b".to_string(), "c".to_string()]);
        new.inherit_visibility(&old);
        assert_eq!(new.visible_headers(), vec!["c"]);
    }
}
