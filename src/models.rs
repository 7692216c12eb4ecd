use std::collections::HashMap;

/// A fully loaded delimited table: ordered header plus string rows.
///
/// All values are text; rows shorter than the header are padded with empty
/// strings at load time so indexing by column is always in bounds.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    index: HashMap<String, usize>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut index = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            index.entry(h.clone()).or_insert(i);
        }
        Self {
            headers,
            rows,
            index,
        }
    }

    /// Index of a column by name; first occurrence wins for duplicate headers.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn value(&self, row: usize, column: usize) -> &str {
        &self.rows[row][column]
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// One surviving input row, reduced to its join-column values.
#[derive(Debug, Clone)]
pub struct InputRecord {
    /// 1-based, assigned in file order after load-time exclusion.
    pub input_id: usize,
    /// Aligned with `InputTable::columns`.
    pub values: Vec<String>,
}

/// The input table restricted to the distinct join columns, with ids assigned.
#[derive(Debug, Clone)]
pub struct InputTable {
    /// Sorted distinct input-side join column names.
    pub columns: Vec<String>,
    pub records: Vec<InputRecord>,
}

impl InputTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_lookup() {
        let t = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec!["1".into(), "2".into()]],
        );
        assert_eq!(t.column_index("b"), Some(1));
        assert_eq!(t.column_index("missing"), None);
        assert_eq!(t.value(0, 1), "2");
    }

    #[test]
    fn duplicate_header_first_wins() {
        let t = Table::new(
            vec!["a".into(), "a".into()],
            vec![vec!["x".into(), "y".into()]],
        );
        assert_eq!(t.column_index("a"), Some(0));
    }
}
