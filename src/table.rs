// In-memory tables: typed cells, row filtering and column selection.
// Every operation returns a new table; the input is never mutated.
use std::fmt;

use crate::error::{Error, Result};

/// Spellings read as a missing value.
const NA_VALUES: &[&str] = &[
    "", "NaN", "nan", "-NaN", "-nan", "NA", "N/A", "n/a", "null", "NULL", "None", "<NA>", "#N/A",
];

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Cell {
    /// Parse a raw CSV field. Surrounding whitespace is ignored when detecting
    /// missing, boolean and numeric values; text keeps the field verbatim.
    pub fn parse(raw: &str) -> Cell {
        let s = raw.trim();
        if NA_VALUES.contains(&s) {
            return Cell::Missing;
        }
        if s.eq_ignore_ascii_case("true") {
            return Cell::Bool(true);
        }
        if s.eq_ignore_ascii_case("false") {
            return Cell::Bool(false);
        }
        if let Ok(i) = s.parse::<i64>() {
            return Cell::Int(i);
        }
        match s.parse::<f64>() {
            Ok(f) if f.is_nan() => Cell::Missing,
            Ok(f) => Cell::Float(f),
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }

    /// Equality against `True`: `1` and `1.0` count, missing does not.
    pub fn is_true(&self) -> bool {
        match self {
            Cell::Bool(b) => *b,
            Cell::Int(i) => *i == 1,
            Cell::Float(f) => *f == 1.0,
            Cell::Missing | Cell::Text(_) => false,
        }
    }

    /// True when the cell holds the identifier `id`, stored as int or float.
    pub fn matches_id(&self, id: i64) -> bool {
        match self {
            Cell::Int(i) => *i == id,
            Cell::Float(f) => *f == id as f64,
            _ => false,
        }
    }

    /// Numeric view used when building feature matrices.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Missing => Some(f64::NAN),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Int(i) => Some(*i as f64),
            Cell::Float(f) => Some(*f),
            Cell::Text(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Missing => Ok(()),
            Cell::Bool(b) => write!(f, "{}", if *b { "True" } else { "False" }),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Float(x) => write!(f, "{x}"),
            Cell::Text(s) => f.write_str(s),
        }
    }
}

/// A named vector of cells, used for prediction targets.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
}

impl Column {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Row-major table with named columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Build a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Table> {
        if let Some((row, cells)) = rows
            .iter()
            .enumerate()
            .find(|(_, cells)| cells.len() != columns.len())
        {
            return Err(Error::RaggedTable {
                row,
                expected: columns.len(),
                found: cells.len(),
            });
        }
        Ok(Table { columns, rows })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Copy one column out of the table.
    pub fn column(&self, name: &str) -> Result<Column> {
        let idx = self.column_index(name)?;
        Ok(Column {
            name: name.to_string(),
            values: self.rows.iter().map(|row| row[idx].clone()).collect(),
        })
    }

    /// Keep the rows for which `keep` returns true, in their original order.
    pub fn filter<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&[Cell]) -> bool,
    {
        Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| keep(row))
                .cloned()
                .collect(),
        }
    }

    /// Drop every row holding at least one missing cell.
    pub fn drop_nulls(&self) -> Table {
        self.filter(|row| !row.iter().any(Cell::is_missing))
    }

    /// Remove the named columns. Unknown names are an error.
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut removed = vec![false; self.width()];
        for name in names {
            removed[self.column_index(name.as_ref())?] = true;
        }
        let keep: Vec<usize> = (0..self.width()).filter(|&i| !removed[i]).collect();
        Ok(self.project(&keep))
    }

    /// Keep only the named columns, in the order given.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let keep = names
            .iter()
            .map(|name| self.column_index(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(self.project(&keep))
    }

    fn project(&self, indices: &[usize]) -> Table {
        Table {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}
