use std::fmt;
use std::io::Read;

use chrono::NaiveDate;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::SheetError;

/// A single spreadsheet cell as delivered by the upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Bool(bool),
    Text(String),
    Empty,
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(text) => text.trim().is_empty(),
            Cell::Number(value) => value.is_nan(),
            Cell::Bool(_) => false,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Text(text) => Some(text.clone()),
            Cell::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                Some(format!("{}", *value as i64))
            }
            Cell::Number(value) => Some(value.to_string()),
            Cell::Bool(flag) => Some(flag.to_string()),
            Cell::Empty => None,
        }
    }
}

impl From<Value> for Cell {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Cell::Empty,
            Value::Bool(flag) => Cell::Bool(flag),
            Value::Number(number) => number.as_f64().map_or(Cell::Empty, Cell::Number),
            Value::String(text) if text.is_empty() => Cell::Empty,
            Value::String(text) => Cell::Text(text),
            other => Cell::Text(other.to_string()),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(value.to_string())
        }
    }
}

static EMPTY_CELL: Cell = Cell::Empty;

/// Row-major cell grid of one worksheet; the first row is the header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWorksheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl RawWorksheet {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    pub fn from_json_values(name: impl Into<String>, values: Vec<Vec<Value>>) -> Self {
        let rows = values
            .into_iter()
            .map(|row| row.into_iter().map(Cell::from).collect())
            .collect();
        Self::new(name, rows)
    }

    /// Reads a headered CSV export. Ragged rows are accepted, as the Sheets API
    /// also trims trailing empty cells.
    pub fn from_csv_reader<R: Read>(name: impl Into<String>, reader: R) -> Result<Self, SheetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(Cell::from).collect());
        }

        Ok(Self::new(name, rows))
    }

    pub fn header(&self) -> Option<&[Cell]> {
        self.rows.first().map(Vec::as_slice)
    }

    pub fn data_rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().skip(1).map(Vec::as_slice)
    }

    pub fn cell(row: &[Cell], index: usize) -> &Cell {
        row.get(index).unwrap_or(&EMPTY_CELL)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Sold,
    Offered,
    Rejected,
    Unknown,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Sold => "sold",
            Status::Offered => "offered",
            Status::Rejected => "rejected",
            Status::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Status {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sold" => Ok(Status::Sold),
            "offered" => Ok(Status::Offered),
            "rejected" => Ok(Status::Rejected),
            "unknown" => Ok(Status::Unknown),
            other => Err(format!("unknown status '{other}'")),
        }
    }
}

/// One record after column mapping and field coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub product: String,
    pub amount: Option<f64>,
    pub event_date: Option<NaiveDate>,
    pub status: Status,
}

#[derive(Debug, Clone)]
pub struct NormalizedSheet {
    pub worksheet: String,
    pub format: &'static str,
    pub frame: DataFrame,
    /// Data rows dropped because the product or amount cell was blank.
    pub skipped_rows: usize,
    pub unparsed_amounts: usize,
    /// Records kept without a usable date; they never land in a week.
    pub missing_dates: usize,
}

impl NormalizedSheet {
    pub fn record_count(&self) -> usize {
        self.frame.height()
    }
}
