//! Tab-separated result tables.
//!
//! Layout, one row per image:
//!
//! ```text
//! name<TAB>h1<TAB>h2...
//! img01<TAB>v11<TAB>v12...
//! ```
//!
//! Values are written with a fixed number of decimals. Size headers are
//! written as integers for uncalibrated runs and with two decimals otherwise
//! (see [`format_size_header`]).

use crate::{IoError, IoResult};
use std::fmt::Write as _;
use std::path::Path;
#[allow(unused_imports)]
use tracing::{debug, trace};

/// Number of decimals written for table values.
pub const PRECISION: usize = 4;

/// One labelled row of values.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    /// Row label, usually the image name.
    pub label: String,
    /// One value per column.
    pub values: Vec<f64>,
}

/// A labelled numeric table with shared column headers.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<TableRow>,
}

impl Table {
    /// Creates an empty table with the given column headers.
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Appends a row.
    ///
    /// # Errors
    ///
    /// Fails if the row length differs from the header count.
    pub fn push_row(&mut self, label: impl Into<String>, values: Vec<f64>) -> IoResult<()> {
        if values.len() != self.headers.len() {
            return Err(IoError::Parse(format!(
                "row has {} values, table has {} columns",
                values.len(),
                self.headers.len()
            )));
        }
        self.rows.push(TableRow {
            label: label.into(),
            values,
        });
        Ok(())
    }

    /// Column headers, without the leading name column.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in insertion order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Finds a row by label.
    pub fn row(&self, label: &str) -> Option<&TableRow> {
        self.rows.iter().find(|r| r.label == label)
    }

    /// Parses every header as a number.
    pub fn numeric_headers(&self) -> IoResult<Vec<f64>> {
        self.headers
            .iter()
            .map(|h| {
                h.trim()
                    .parse::<f64>()
                    .map_err(|_| IoError::Parse(format!("column header '{}' is not a size", h)))
            })
            .collect()
    }

    /// Largest value over all rows, for plot axis limits.
    pub fn y_max(&self) -> Option<f64> {
        self.rows
            .iter()
            .flat_map(|r| r.values.iter().copied())
            .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
    }

    /// Renders the table as tab-separated text.
    pub fn to_tsv(&self) -> String {
        let mut out = String::from("name");
        for h in &self.headers {
            out.push('\t');
            out.push_str(h);
        }
        out.push('\n');
        for row in &self.rows {
            out.push_str(&row.label);
            for v in &row.values {
                let _ = write!(out, "\t{:.*}", PRECISION, v);
            }
            out.push('\n');
        }
        out
    }

    /// Writes the table to `path`.
    pub fn write_tsv<P: AsRef<Path>>(&self, path: P) -> IoResult<()> {
        trace!(path = %path.as_ref().display(), rows = self.rows.len(), "Table::write_tsv");
        std::fs::write(path, self.to_tsv())?;
        Ok(())
    }

    /// Parses tab-separated text produced by [`Table::to_tsv`].
    pub fn parse_tsv(text: &str) -> IoResult<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| IoError::Parse("empty table".into()))?;
        let headers: Vec<String> = header
            .split('\t')
            .skip(1)
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(headers);
        for (i, line) in lines.enumerate() {
            let mut fields = line.split('\t');
            let label = fields.next().unwrap_or_default().trim().to_string();
            let values = fields
                .map(|f| {
                    f.trim().parse::<f64>().map_err(|_| {
                        IoError::Parse(format!("line {}: invalid number '{}'", i + 2, f.trim()))
                    })
                })
                .collect::<IoResult<Vec<f64>>>()?;
            table
                .push_row(label, values)
                .map_err(|e| IoError::Parse(format!("line {}: {}", i + 2, e)))?;
        }
        Ok(table)
    }

    /// Reads a table written by [`Table::write_tsv`].
    pub fn read_tsv<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        trace!(path = %path.as_ref().display(), "Table::read_tsv");
        Self::parse_tsv(&std::fs::read_to_string(path)?)
    }
}

/// Formats a size column header.
///
/// Integer sizes print without decimals; calibrated sizes print with two.
pub fn format_size_header(size: f64, integer: bool) -> String {
    if integer {
        format!("{}", size.round() as i64)
    } else {
        format!("{:.2}", size)
    }
}
