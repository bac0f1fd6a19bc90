//! Per-unit numeric values for choropleth maps, loaded from CSV.
//!
//! ```text
//! code,value
//! 13101,100
//! 13102,200
//! ```
//!
//! Column names are configurable. Rows with an empty value are skipped.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use hashbrown::HashMap;
use tracing::{debug, info};

use crate::error::{AtlasError, Result};
use crate::models::UnitCode;

/// Unit code to value.
#[derive(Debug, Clone, Default)]
pub struct ValueTable {
    values: HashMap<UnitCode, f64>,
}

impl ValueTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: UnitCode, value: f64) {
        self.values.insert(code, value);
    }

    pub fn get(&self, code: &UnitCode) -> Option<f64> {
        self.values.get(code).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| AtlasError::Config(format!("value table has no '{}' column", name)))
}

/// Parse a value table from any CSV reader
pub fn read_values<R: Read>(reader: R, code_column: &str, value_column: &str) -> Result<ValueTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AtlasError::Config(format!("unreadable value header: {}", e)))?
        .clone();
    let code_idx = column(&headers, code_column)?;
    let value_idx = column(&headers, value_column)?;

    let mut table = ValueTable::new();
    for (line, result) in csv_reader.records().enumerate() {
        let record = result.map_err(|e| AtlasError::Config(format!("value row {}: {}", line + 1, e)))?;

        let code = record.get(code_idx).unwrap_or("");
        let raw = record.get(value_idx).unwrap_or("");
        if code.is_empty() || raw.is_empty() {
            debug!("Skipping value row {}", line + 1);
            continue;
        }

        let value: f64 = raw
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| AtlasError::Config(format!("value row {}: '{}' is not a number", line + 1, raw)))?;
        table.insert(UnitCode::new(code), value);
    }

    Ok(table)
}

/// Load a value table from a CSV file (`.gz` is decompressed)
pub fn load_values(path: &Path, code_column: &str, value_column: &str) -> Result<ValueTable> {
    info!("Loading values from {}", path.display());

    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let table = read_values(reader, code_column, value_column)?;
    info!("Loaded {} values", table.len());
    Ok(table)
}
