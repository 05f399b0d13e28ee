use anyhow::{Context, Result};
use csv::ReaderBuilder;
use std::{fs::File, io::Read, path::Path};
use tracing::{debug, warn};

use super::utils::parse_number;

/// A single source cell.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Text(String),
    Number(f64),
    Missing,
}

impl RawValue {
    /// Empty or whitespace-only text counts as missing.
    pub fn from_cell(cell: &str) -> Self {
        if cell.trim().is_empty() {
            RawValue::Missing
        } else {
            RawValue::Text(cell.to_string())
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, RawValue::Missing)
    }

    /// Text rendering; `None` for missing cells.
    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Text(s) => Some(s.clone()),
            RawValue::Number(n) => Some(n.to_string()),
            RawValue::Missing => None,
        }
    }

    /// Numeric reading; `None` for missing or unparseable cells.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Text(s) => parse_number(s),
            RawValue::Number(n) => Some(*n).filter(|v| v.is_finite()),
            RawValue::Missing => None,
        }
    }
}

impl From<&str> for RawValue {
    fn from(s: &str) -> Self {
        RawValue::from_cell(s)
    }
}

impl From<f64> for RawValue {
    fn from(n: f64) -> Self {
        RawValue::Number(n)
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(RawValue::Missing)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    /// Column labels as the source spelled them.
    pub headers: Vec<String>,
    /// One entry per data row; short rows are padded with `Missing`.
    pub rows: Vec<Vec<RawValue>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<RawValue>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.resize(width.max(r.len()), RawValue::Missing);
                r
            })
            .collect();
        Self { headers, rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Cell at (`row`, `col`), or `Missing` past the end of a ragged row.
    pub fn cell(&self, row: usize, col: usize) -> &RawValue {
        static MISSING: RawValue = RawValue::Missing;
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&MISSING)
    }

    /// Read a headed CSV from `reader`, keeping at most `nrows` data rows.
    pub fn from_csv_reader<R: Read>(reader: R, nrows: Option<usize>) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // ragged rows are padded, not rejected
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("reading CSV header row")?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.is_empty() {
            warn!("CSV has an empty header row");
        }

        let limit = nrows.unwrap_or(usize::MAX);
        let mut rows = Vec::new();
        for (idx, result) in rdr.records().take(limit).enumerate() {
            let record = result.with_context(|| format!("CSV parse error at record {}", idx))?;
            rows.push(record.iter().map(RawValue::from_cell).collect());
        }
        debug!(columns = headers.len(), rows = rows.len(), "read CSV");

        Ok(Self::new(headers, rows))
    }

    /// Open and read a headed CSV file.
    #[tracing::instrument(level = "info", skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_csv_path<P: AsRef<Path>>(path: P, nrows: Option<usize>) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open CSV file: {:?}", path.as_ref()))?;
        Self::from_csv_reader(file, nrows)
            .with_context(|| format!("Failed to read CSV file: {:?}", path.as_ref()))
    }
}
