//! CSV decoding into typed, previewable tables.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

/// Ordered header → value mapping for one previewed row.
pub type PreviewRow = IndexMap<String, Value>;

/// Errors raised while turning uploaded bytes into a table.
#[derive(Debug, Error)]
pub enum TableError {
    /// The header row is missing or empty.
    #[error("csv contains no columns")]
    NoColumns,
    /// Header present but no data rows.
    #[error("csv contains no data rows")]
    Empty,
    /// A data row has more fields than the header.
    #[error("Expected {expected} fields in line {line}, saw {found}")]
    Malformed {
        /// 1-based line of the offending record.
        line: u64,
        /// Header width.
        expected: usize,
        /// Fields found.
        found: usize,
    },
    /// Reader failure (invalid UTF-8, I/O).
    #[error("{0}")]
    Parse(#[from] csv::Error),
}

impl TableError {
    /// Whether the bytes could not be read as CSV at all, as opposed to a structurally empty table.
    #[must_use]
    pub const fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Parse(_))
    }
}

/// Inferred type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Every present cell is an integer.
    Integer,
    /// Every present cell is a number.
    Float,
    /// Every present cell is `true`/`false`.
    Boolean,
    /// Anything else.
    Text,
}

/// Typed cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Empty cell.
    Null,
    /// Integer cell.
    Integer(i64),
    /// Floating point cell.
    Float(f64),
    /// Boolean cell.
    Boolean(bool),
    /// Text cell.
    Text(String),
}

impl CellValue {
    /// JSON rendering; non-finite floats become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Integer(v) => Value::from(*v),
            Self::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Self::Boolean(v) => Value::Bool(*v),
            Self::Text(v) => Value::String(v.clone()),
        }
    }
}

/// Parsed CSV upload.
#[derive(Debug, Clone)]
pub struct CsvTable {
    headers: Vec<String>,
    kinds: Vec<ColumnKind>,
    rows: Vec<Vec<CellValue>>,
}

impl CsvTable {
    /// Parses CSV bytes whose first record is the header row.
    pub fn parse(bytes: &[u8]) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);
        let raw_headers = reader.headers()?.clone();
        if raw_headers.is_empty() {
            return Err(TableError::NoColumns);
        }
        let headers = normalize_headers(raw_headers.iter());
        let width = headers.len();

        let mut raw_rows: Vec<Vec<Option<String>>> = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.len() > width {
                return Err(TableError::Malformed {
                    line: record.position().map_or(0, csv::Position::line),
                    expected: width,
                    found: record.len(),
                });
            }
            let mut cells: Vec<Option<String>> = record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect();
            cells.resize(width, None);
            raw_rows.push(cells);
        }
        if raw_rows.is_empty() {
            return Err(TableError::Empty);
        }

        let kinds: Vec<ColumnKind> = (0..width)
            .map(|col| infer_kind(raw_rows.iter().filter_map(|row| row[col].as_deref())))
            .collect();
        let rows = raw_rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .zip(&kinds)
                    .map(|(cell, kind)| convert(cell, *kind))
                    .collect()
            })
            .collect();
        Ok(Self {
            headers,
            kinds,
            rows,
        })
    }

    /// Column names after normalization.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Inferred column types, aligned with `headers`.
    #[must_use]
    pub fn column_kinds(&self) -> &[ColumnKind] {
        &self.kinds
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// Typed rows.
    #[must_use]
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// First `limit` rows as header → value records.
    #[must_use]
    pub fn preview(&self, limit: usize) -> Vec<PreviewRow> {
        self.rows
            .iter()
            .take(limit)
            .map(|row| {
                self.headers
                    .iter()
                    .cloned()
                    .zip(row.iter().map(CellValue::to_json))
                    .collect()
            })
            .collect()
    }
}

/// Blank names become `Unnamed: <i>`; repeats get `.1`, `.2`, ... suffixes.
fn normalize_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headers = Vec::new();
    for (idx, name) in raw.enumerate() {
        let base = if name.trim().is_empty() {
            format!("Unnamed: {idx}")
        } else {
            name.to_string()
        };
        let mut candidate = base.clone();
        while let Some(count) = seen.get_mut(&candidate) {
            *count += 1;
            candidate = format!("{base}.{count}");
        }
        seen.insert(candidate.clone(), 0);
        headers.push(candidate);
    }
    headers
}

fn is_bool(cell: &str) -> bool {
    cell.eq_ignore_ascii_case("true") || cell.eq_ignore_ascii_case("false")
}

fn infer_kind<'a>(cells: impl Iterator<Item = &'a str> + Clone) -> ColumnKind {
    let mut present = cells.map(str::trim).peekable();
    if present.peek().is_none() {
        return ColumnKind::Float;
    }
    if present.clone().all(|c| c.parse::<i64>().is_ok()) {
        ColumnKind::Integer
    } else if present.clone().all(|c| c.parse::<f64>().is_ok()) {
        ColumnKind::Float
    } else if present.all(is_bool) {
        ColumnKind::Boolean
    } else {
        ColumnKind::Text
    }
}

fn convert(cell: Option<String>, kind: ColumnKind) -> CellValue {
    let Some(raw) = cell else {
        return CellValue::Null;
    };
    let trimmed = raw.trim();
    match kind {
        ColumnKind::Integer => trimmed.parse().map_or(CellValue::Null, CellValue::Integer),
        ColumnKind::Float => trimmed.parse().map_or(CellValue::Null, CellValue::Float),
        ColumnKind::Boolean => CellValue::Boolean(trimmed.eq_ignore_ascii_case("true")),
        ColumnKind::Text => CellValue::Text(raw),
    }
}
