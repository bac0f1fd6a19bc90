//! Relationship tables loaded from CSV.
//!
//! Expected columns (header required, order free):
//!
//! ```text
//! code,name,coastal,adjacent
//! 13,東京都,true,11;12;14;19
//! 19,山梨県,false,11;13;14;20;22
//! ```
//!
//! `name` is optional. `adjacent` holds `;`-separated codes and may be empty.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use flate2::read::GzDecoder;
use tracing::info;

use crate::error::{AtlasError, Result};
use crate::models::{Relationship, RelationshipTable, UnitCode};

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" | "" => Some(false),
        _ => None,
    }
}

fn column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Parse a relationship table from any CSV reader
pub fn read_relationships<R: Read>(reader: R) -> Result<RelationshipTable> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|e| AtlasError::Config(format!("unreadable relationship header: {}", e)))?
        .clone();

    let code_idx = column(&headers, "code")
        .ok_or_else(|| AtlasError::Config("relationship table has no 'code' column".into()))?;
    let coastal_idx = column(&headers, "coastal")
        .ok_or_else(|| AtlasError::Config("relationship table has no 'coastal' column".into()))?;
    let adjacent_idx = column(&headers, "adjacent")
        .ok_or_else(|| AtlasError::Config("relationship table has no 'adjacent' column".into()))?;
    let name_idx = column(&headers, "name");

    let mut table = RelationshipTable::new();

    for (line, result) in csv_reader.records().enumerate() {
        let record =
            result.map_err(|e| AtlasError::Config(format!("relationship row {}: {}", line + 1, e)))?;

        let code = UnitCode::new(record.get(code_idx).unwrap_or(""));
        if code.as_str().is_empty() {
            continue;
        }

        let coastal_raw = record.get(coastal_idx).unwrap_or("");
        let coastal = parse_flag(coastal_raw).ok_or_else(|| {
            AtlasError::Config(format!(
                "relationship row {}: '{}' is not a coastal flag",
                line + 1,
                coastal_raw
            ))
        })?;

        let adjacent = record
            .get(adjacent_idx)
            .unwrap_or("")
            .split(';')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(UnitCode::from)
            .collect();

        let name = name_idx
            .and_then(|i| record.get(i))
            .filter(|n| !n.is_empty())
            .map(String::from);

        table.insert(
            code,
            Relationship {
                name,
                adjacent,
                coastal,
            },
        );
    }

    Ok(table)
}

/// Load a relationship table from a CSV file (`.gz` is decompressed)
pub fn load_relationships(path: &Path) -> Result<RelationshipTable> {
    info!("Loading relationship table from {}", path.display());

    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().map_or(false, |e| e == "gz") {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let table = read_relationships(reader)?;
    info!("Loaded {} relationship entries", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "code,name,coastal,adjacent\n\
                          A,Alpha,false,B\n\
                          B,Beta,true,\n\
                          C,,0,A; B\n";

    #[test]
    fn test_read_sample() {
        let table = read_relationships(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);

        let a = table.get(&UnitCode::from("A")).unwrap();
        assert_eq!(a.name.as_deref(), Some("Alpha"));
        assert!(!a.coastal);
        assert!(a.adjacent.contains(&UnitCode::from("B")));

        let b = table.get(&UnitCode::from("B")).unwrap();
        assert!(b.coastal);
        assert!(b.adjacent.is_empty());

        let c = table.get(&UnitCode::from("C")).unwrap();
        assert_eq!(c.name, None);
        assert_eq!(c.adjacent.len(), 2);
    }

    #[test]
    fn test_missing_column() {
        let err = read_relationships("code,coastal\nA,true\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("adjacent"));
    }

    #[test]
    fn test_bad_flag() {
        let err = read_relationships("code,coastal,adjacent\nA,maybe,\n".as_bytes()).unwrap_err();
        assert!(matches!(err, AtlasError::Config(_)));
    }

    #[test]
    fn test_load_gzipped_file() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relations.csv.gz");
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(SAMPLE.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let table = load_relationships(&path).unwrap();
        assert_eq!(table.len(), 3);
    }
}
