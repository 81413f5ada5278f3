//! In-memory record tables.
//!
//! A table is loaded once and never mutated afterwards. Every filter
//! returns a new table that keeps the input row order.

use crate::{
    error::{GraphError, GraphResult},
    types::ColumnName,
};
use chrono::NaiveDate;
use std::{collections::HashMap, fmt, io};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Spellings the datasets use for an empty cell.
const MISSING_MARKERS: &[&str] = &["NA", "N/A", "NaN", "nan", "null", "NULL", "None"];

/// A single typed cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Missing,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Value {
    /// Type a raw CSV cell: empty → Missing, ISO date → Date,
    /// float → Number, anything else → Text.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || MISSING_MARKERS.contains(&raw) {
            return Value::Missing;
        }
        if let Ok(n) = raw.parse::<f64>() {
            if n.is_nan() {
                return Value::Missing;
            }
            return Value::Number(n);
        }
        if let Ok(d) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
            return Value::Date(d);
        }
        Value::Text(raw.to_string())
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => f.write_str(s),
            // Whole amounts print without a trailing ".0".
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(raw: &str) -> Self {
        Value::parse(raw)
    }
}

/// A cell as read from the file: the exact text plus its typed value.
///
/// Ids, names and written copies always use `raw`, so `007` and `7` stay
/// distinct and `Infinity` stays a word.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cell {
    raw: String,
    value: Value,
}

impl Cell {
    pub fn parse(raw: &str) -> Self {
        Self { raw: raw.to_string(), value: Value::parse(raw) }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn is_missing(&self) -> bool {
        self.value.is_missing()
    }

    /// Trimmed input text, or None for a missing cell.
    pub fn text(&self) -> Option<&str> {
        (!self.is_missing()).then(|| self.raw.trim())
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Cell {
    fn from(raw: &str) -> Self {
        Cell::parse(raw)
    }
}

/// Ordered rows sharing one header.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    name: String,
    headers: Vec<ColumnName>,
    positions: HashMap<ColumnName, usize>,
    rows: Vec<Vec<Cell>>,
}

impl RecordTable {
    /// Build a table from already-parsed rows. Every row must match the
    /// header width.
    pub fn new(
        name: impl Into<String>,
        headers: Vec<ColumnName>,
        rows: Vec<Vec<Cell>>,
    ) -> GraphResult<Self> {
        let name = name.into();
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(anyhow::anyhow!(
                "{name}: row {i} has {} values, expected {}",
                row.len(),
                headers.len()
            )
            .into());
        }
        let mut positions = HashMap::with_capacity(headers.len());
        for (i, h) in headers.iter().enumerate() {
            // First occurrence wins for duplicated headers.
            positions.entry(h.clone()).or_insert(i);
        }
        Ok(Self { name, headers, positions, rows })
    }

    /// Parse CSV text with a header line. Reading stops after `row_cap`
    /// data rows. A row with the wrong number of fields fails the load.
    pub fn from_reader<R: io::Read>(
        name: impl Into<String>,
        reader: R,
        row_cap: Option<usize>,
    ) -> GraphResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(reader);
        let headers: Vec<ColumnName> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let mut rows = Vec::new();
        for record in rdr.records().take(row_cap.unwrap_or(usize::MAX)) {
            let record = record?;
            rows.push(record.iter().map(Cell::parse).collect());
        }
        Self::new(name, headers, rows)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[ColumnName] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    pub fn column_index(&self, column: &str) -> GraphResult<usize> {
        self.positions
            .get(column)
            .copied()
            .ok_or_else(|| GraphError::MissingColumn {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn row(&self, index: usize) -> Option<Row<'_>> {
        (index < self.rows.len()).then_some(Row { table: self, index })
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> + '_ {
        (0..self.rows.len()).map(move |index| Row { table: self, index })
    }

    /// Keep the rows matching `keep`, in their original order.
    pub fn filter<F>(&self, mut keep: F) -> RecordTable
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let rows = self
            .rows()
            .filter(|r| keep(r))
            .map(|r| r.cells().to_vec())
            .collect();
        RecordTable {
            name: self.name.clone(),
            headers: self.headers.clone(),
            positions: self.positions.clone(),
            rows,
        }
    }
}

/// Borrowed view of one row.
#[derive(Clone, Copy)]
pub struct Row<'a> {
    table: &'a RecordTable,
    index: usize,
}

impl<'a> Row<'a> {
    /// Position of the row in its table.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn cells(&self) -> &'a [Cell] {
        &self.table.rows[self.index]
    }

    /// Cell under `column`, or None when the table has no such column.
    pub fn cell(&self, column: &str) -> Option<&'a Cell> {
        let pos = *self.table.positions.get(column)?;
        self.cells().get(pos)
    }

    /// Typed value under `column`.
    pub fn get(&self, column: &str) -> Option<&'a Value> {
        self.cell(column).map(Cell::value)
    }

    /// Non-missing cell under `column` as an id string, exactly as written
    /// in the file apart from surrounding whitespace.
    pub fn key(&self, column: &str) -> Option<String> {
        self.cell(column).and_then(Cell::text).map(str::to_string)
    }

    pub fn is_present(&self, column: &str) -> bool {
        self.get(column).is_some_and(|v| !v.is_missing())
    }
}

impl fmt::Debug for Row<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("index", &self.index)
            .field("cells", &self.cells())
            .finish()
    }
}
