//! Column-oriented table used between stages.

use crate::errors::{Result, SensorError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Strings read as a missing value.
pub const MISSING_MARKERS: [&str; 4] = ["na", "NA", "nan", "NaN"];

/// A single table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    /// No value (`""`, `na`, `NaN`, JSON null).
    Missing,
    /// A numeric value.
    Number(f64),
    /// Any other value.
    Text(String),
}

impl Cell {
    /// Parses a raw field.
    ///
    /// # Examples
    ///
    /// ```
    /// use sensorflow::data::Cell;
    ///
    /// assert_eq!(Cell::parse(" 3.5 "), Cell::Number(3.5));
    /// assert_eq!(Cell::parse("na"), Cell::Missing);
    /// assert_eq!(Cell::parse("pos"), Cell::Text("pos".to_string()));
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || MISSING_MARKERS.contains(&trimmed) {
            return Self::Missing;
        }
        match trimmed.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Number(value),
            _ => Self::Text(trimmed.to_string()),
        }
    }

    /// Converts a JSON value from the document store.
    #[must_use]
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Missing,
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Missing, Self::Number),
            serde_json::Value::String(s) => Self::parse(s),
            serde_json::Value::Bool(b) => Self::Text(b.to_string()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Converts to JSON; missing becomes null.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Missing => serde_json::Value::Null,
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Text(s) => serde_json::Value::String(s.clone()),
        }
    }

    /// Returns the numeric value, if any.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text value, if any.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns true for a missing value.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Self::Missing
        } else {
            Self::Number(value)
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A named column of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    name: String,
    values: Vec<Cell>,
}

impl Column {
    /// Creates a column.
    #[must_use]
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Creates a numeric column.
    #[must_use]
    pub fn numeric(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, values.into_iter().map(Cell::from).collect())
    }

    /// Creates a text column.
    #[must_use]
    pub fn text<S: AsRef<str>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            values.into_iter().map(|v| Cell::Text(v.as_ref().to_string())).collect(),
        )
    }

    /// The column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The cells, in row order.
    #[must_use]
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the column has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// True when every present cell is a number.
    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.values
            .iter()
            .all(|cell| matches!(cell, Cell::Number(_) | Cell::Missing))
    }

    /// The present numeric values, skipping missing cells.
    #[must_use]
    pub fn numbers(&self) -> Vec<f64> {
        self.values.iter().filter_map(Cell::as_f64).collect()
    }

    /// Sample standard deviation (ddof = 1) over present values.
    ///
    /// `None` for non-numeric columns or fewer than two present values.
    #[must_use]
    pub fn std_dev(&self) -> Option<f64> {
        if !self.is_numeric() {
            return None;
        }
        let values = self.numbers();
        if values.len() < 2 {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
        Some(var.sqrt())
    }

    fn select(&self, rows: &[usize]) -> Self {
        Self {
            name: self.name.clone(),
            values: rows.iter().map(|&i| self.values[i].clone()).collect(),
        }
    }
}

/// A rectangular table of named columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    columns: Vec<Column>,
    n_rows: usize,
}

/// A store document: field name to JSON value.
pub type Record = serde_json::Map<String, serde_json::Value>;

impl Dataset {
    /// Creates a dataset from columns.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` on duplicate names or unequal lengths.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let n_rows = columns.first().map_or(0, Column::len);
        let mut seen = HashSet::new();
        for column in &columns {
            if !seen.insert(column.name.as_str()) {
                return Err(SensorError::invalid_data(format!(
                    "duplicate column '{}'",
                    column.name
                )));
            }
            if column.len() != n_rows {
                return Err(SensorError::invalid_data(format!(
                    "column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    n_rows
                )));
            }
        }
        Ok(Self { columns, n_rows })
    }

    /// Creates a dataset from a header and row-major cells.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` if a row's width differs from the header.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut columns: Vec<Vec<Cell>> = headers.iter().map(|_| Vec::with_capacity(rows.len())).collect();
        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != headers.len() {
                return Err(SensorError::invalid_data(format!(
                    "row {} has {} fields, expected {}",
                    index + 1,
                    row.len(),
                    headers.len()
                )));
            }
            for (column, cell) in columns.iter_mut().zip(row) {
                column.push(cell);
            }
        }
        Self::new(
            headers
                .into_iter()
                .zip(columns)
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Creates a dataset from store documents.
    ///
    /// Columns follow first-seen field order; fields absent from a document
    /// are missing in that row.
    ///
    /// # Errors
    ///
    /// Propagates construction errors.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let mut headers: Vec<String> = Vec::new();
        let mut known = HashSet::new();
        for record in records {
            for key in record.keys() {
                if known.insert(key.clone()) {
                    headers.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).map_or(Cell::Missing, Cell::from_json))
                    .collect()
            })
            .collect();
        Self::from_rows(headers, rows)
    }

    /// Converts to store documents; missing cells become null.
    #[must_use]
    pub fn to_records(&self) -> Vec<Record> {
        (0..self.n_rows)
            .map(|row| {
                self.columns
                    .iter()
                    .map(|c| (c.name.clone(), c.values[row].to_json()))
                    .collect()
            })
            .collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[must_use]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows or no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.columns.is_empty()
    }

    /// The columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Column names, in order.
    #[must_use]
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(Column::name).collect()
    }

    /// Looks up a column by name.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Returns true if a column with this name exists.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// One row, in column order.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        (index < self.n_rows).then(|| self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// Removes the named columns that exist.
    ///
    /// Returns the reduced table and the names actually dropped.
    #[must_use]
    pub fn drop_columns<S: AsRef<str>>(&self, names: &[S]) -> (Self, Vec<String>) {
        let wanted: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        let mut dropped = Vec::new();
        let mut kept = Vec::new();
        for column in &self.columns {
            if wanted.contains(column.name.as_str()) {
                dropped.push(column.name.clone());
            } else {
                kept.push(column.clone());
            }
        }
        let n_rows = if kept.is_empty() { 0 } else { self.n_rows };
        (Self { columns: kept, n_rows }, dropped)
    }

    /// Removes and returns one column.
    #[must_use]
    pub fn take_column(&self, name: &str) -> Option<(Self, Column)> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        let mut columns = self.columns.clone();
        let taken = columns.remove(index);
        let n_rows = if columns.is_empty() { 0 } else { self.n_rows };
        Some((Self { columns, n_rows }, taken))
    }

    /// Appends a column.
    ///
    /// # Errors
    ///
    /// Returns `SensorError::InvalidData` on a name clash or length mismatch.
    pub fn with_column(&self, column: Column) -> Result<Self> {
        let mut columns = self.columns.clone();
        columns.push(column);
        Self::new(columns)
    }

    /// Builds a new table from the given row indices, in that order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of bounds.
    #[must_use]
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self.columns.iter().map(|c| c.select(rows)).collect(),
            n_rows: rows.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Dataset {
        Dataset::new(vec![
            Column::text("class", ["neg", "pos", "neg"]),
            Column::numeric("aa_000", [1.0, 2.0, 3.0]),
            Column::new("ab_000", vec![Cell::Missing, Cell::Number(5.0), Cell::Number(5.0)]),
        ])
        .unwrap()
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse(""), Cell::Missing);
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("-2"), Cell::Number(-2.0));
        assert_eq!(Cell::parse("inf"), Cell::Text("inf".to_string()));
    }

    #[test]
    fn test_cell_from_json() {
        assert_eq!(Cell::from_json(&json!(null)), Cell::Missing);
        assert_eq!(Cell::from_json(&json!("na")), Cell::Missing);
        assert_eq!(Cell::from_json(&json!("12")), Cell::Number(12.0));
        assert_eq!(Cell::from_json(&json!(1.5)), Cell::Number(1.5));
        assert_eq!(Cell::from_json(&json!("neg")), Cell::Text("neg".to_string()));
    }

    #[test]
    fn test_shape() {
        let ds = sample();
        assert_eq!(ds.n_rows(), 3);
        assert_eq!(ds.n_columns(), 3);
        assert_eq!(ds.column_names(), vec!["class", "aa_000", "ab_000"]);
        assert!(!ds.is_empty());
        assert!(Dataset::default().is_empty());
    }

    #[test]
    fn test_rejects_ragged_columns() {
        let err = Dataset::new(vec![
            Column::numeric("a", [1.0]),
            Column::numeric("b", [1.0, 2.0]),
        ])
        .unwrap_err();
        assert_eq!(err.kind(), crate::errors::ErrorKind::InvalidData);
    }

    #[test]
    fn test_rejects_duplicate_columns() {
        assert!(Dataset::new(vec![Column::numeric("a", [1.0]), Column::numeric("a", [2.0])]).is_err());
    }

    #[test]
    fn test_from_records_union_of_fields() {
        let records: Vec<Record> = vec![
            json!({"a": 1, "b": "na"}).as_object().unwrap().clone(),
            json!({"a": 2, "c": "x"}).as_object().unwrap().clone(),
        ];
        let ds = Dataset::from_records(&records).unwrap();

        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.n_columns(), 3);
        assert_eq!(ds.column("b").unwrap().values(), &[Cell::Missing, Cell::Missing]);
        assert_eq!(ds.column("c").unwrap().values()[1], Cell::Text("x".to_string()));
    }

    #[test]
    fn test_drop_columns_reports_present_only() {
        let (ds, dropped) = sample().drop_columns(&["ab_000", "zz_999"]);
        assert_eq!(dropped, vec!["ab_000".to_string()]);
        assert_eq!(ds.column_names(), vec!["class", "aa_000"]);
        assert_eq!(ds.n_rows(), 3);
    }

    #[test]
    fn test_select_rows() {
        let ds = sample().select_rows(&[2, 0]);
        assert_eq!(ds.n_rows(), 2);
        assert_eq!(ds.column("aa_000").unwrap().numbers(), vec![3.0, 1.0]);
    }

    #[test]
    fn test_std_dev() {
        let ds = sample();
        let aa = ds.column("aa_000").unwrap().std_dev().unwrap();
        assert!((aa - 1.0).abs() < 1e-12);
        assert_eq!(ds.column("ab_000").unwrap().std_dev(), Some(0.0));
        assert_eq!(ds.column("class").unwrap().std_dev(), None);
    }

    #[test]
    fn test_take_column() {
        let (features, target) = sample().take_column("class").unwrap();
        assert_eq!(target.name(), "class");
        assert_eq!(features.n_columns(), 2);
        assert!(sample().take_column("missing").is_none());
    }

    #[test]
    fn test_to_records() {
        let records = sample().to_records();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0]["ab_000"], json!(null));
        assert_eq!(records[1]["class"], json!("pos"));
    }
}
