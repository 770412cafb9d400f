//! Column-ordered tables with an equal-length invariant.
//!
//! Column names may repeat (`Unit`, `Term Source REF`, ...); column order is
//! part of the output format.

use std::cmp::Ordering;
use std::io::{self, Write};

use thiserror::Error;

/// `None` marks "not present for this record".
pub type Cell = Option<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("column '{column}' has {found} values, table has {expected} rows")]
    LengthMismatch {
        column: String,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Option<usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table whose row count is fixed before any column is added.
    pub fn with_rows(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows: Some(rows),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.unwrap_or(0)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// First column with this name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn push(&mut self, column: Column) -> Result<(), TableError> {
        let found = column.values.len();
        match self.rows {
            Some(expected) if expected != found => {
                return Err(TableError::LengthMismatch {
                    column: column.name,
                    expected,
                    found,
                })
            }
            _ => self.rows = Some(found),
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Cell>,
    ) -> Result<(), TableError> {
        self.push(Column::new(name, values))
    }

    /// Same value in every row.
    pub fn push_constant(&mut self, name: impl Into<String>, value: &str) {
        let values = vec![Some(value.to_string()); self.row_count()];
        self.rows = Some(values.len());
        self.columns.push(Column::new(name, values));
    }

    pub fn retain_columns(&mut self, mut keep: impl FnMut(&Column) -> bool) {
        self.columns.retain(|c| keep(c));
    }

    /// Stable sort of all rows by the first column called `name`; nulls first.
    pub fn sort_rows_by(&mut self, name: &str) {
        let Some(key) = self.column(name).map(|c| c.values.clone()) else {
            return;
        };
        let mut order: Vec<usize> = (0..key.len()).collect();
        order.sort_by(|&a, &b| match (&key[a], &key[b]) {
            (Some(x), Some(y)) => x.cmp(y),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        for column in &mut self.columns {
            column.values = order.iter().map(|&i| column.values[i].clone()).collect();
        }
    }

    pub fn row(&self, index: usize) -> Vec<Option<&str>> {
        self.columns
            .iter()
            .map(|c| c.values.get(index).and_then(|v| v.as_deref()))
            .collect()
    }

    /// Tab-separated output with a header row; nulls become empty fields.
    /// Fields holding a tab, line break or quote are quoted, inner quotes
    /// doubled.
    pub fn write_tsv<W: Write>(&self, out: W) -> io::Result<()> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .terminator(csv::Terminator::Any(b'\n'))
            .quote_style(csv::QuoteStyle::Necessary)
            .from_writer(out);
        writer.write_record(self.columns.iter().map(|c| c.name.as_str()))?;
        for i in 0..self.row_count() {
            writer.write_record(self.row(i).into_iter().map(|v| v.unwrap_or_default()))?;
        }
        writer.flush()
    }

    pub fn to_tsv_string(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_tsv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}
