//! Zip archives such as the N03 `_GML.zip` distributions.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::ZipArchive;

use crate::error::{AtlasError, Result};

/// Unpack an archive into a temporary directory that lives as long as the
/// returned handle.
pub fn extract(bytes: Vec<u8>, location: &str) -> Result<TempDir> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| AtlasError::data_fetch(location, e))?;
    let dir = Builder::new().prefix("boundary-atlas-").tempdir()?;

    info!("Extracting {} entries from {}", archive.len(), location);
    archive
        .extract(dir.path())
        .map_err(|e| AtlasError::data_fetch(location, e))?;

    Ok(dir)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

/// Pick the geometry file inside an extracted archive.
///
/// With `member` set, the entry whose path ends with it is used. Otherwise the
/// first shapefile wins, then the first GeoJSON file, in file name order.
pub fn find_member(dir: &Path, member: Option<&str>, location: &str) -> Result<PathBuf> {
    let files: Vec<PathBuf> = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();
    debug!("Archive {} holds {} files", location, files.len());

    let found = match member {
        Some(member) => files.into_iter().find(|path| path.ends_with(member)),
        None => files
            .iter()
            .find(|path| has_extension(path, &["shp"]))
            .or_else(|| files.iter().find(|path| has_extension(path, &["geojson", "json"])))
            .cloned(),
    };

    found.ok_or_else(|| match member {
        Some(member) => AtlasError::data_fetch(location, format!("archive has no member '{}'", member)),
        None => AtlasError::data_fetch(location, "archive contains no shapefile or GeoJSON"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_member_selection() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("N03-22_14_220101")).unwrap();
        fs::write(dir.path().join("KS-META.xml"), "").unwrap();
        fs::write(dir.path().join("N03-22_14_220101/N03-22_14_220101.geojson"), "{}").unwrap();
        fs::write(dir.path().join("N03-22_14_220101/N03-22_14_220101.shp"), "").unwrap();

        let shp = find_member(dir.path(), None, "archive").unwrap();
        assert_eq!(shp.extension().unwrap(), "shp");

        let geojson = find_member(dir.path(), Some("N03-22_14_220101.geojson"), "archive").unwrap();
        assert_eq!(geojson.extension().unwrap(), "geojson");

        assert!(matches!(
            find_member(dir.path(), Some("missing.shp"), "archive"),
            Err(AtlasError::DataFetch { .. })
        ));
    }

    #[test]
    fn test_corrupt_archive() {
        assert!(matches!(
            extract(b"not a zip".to_vec(), "junk.zip"),
            Err(AtlasError::DataFetch { .. })
        ));
    }
}
