//! Map rendering behind the [`MapComposer`] seam, plus file output.

pub mod export;
mod html;
mod style;

use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::info;

pub use self::export::to_feature_collection;
pub use self::html::HtmlComposer;
pub use self::style::{
    choropleth_style, palette_style, plain_style, relationship_style, LegendLabels, RenderConfig, Style, StyleAttributes,
    StyleKind,
};

use crate::error::{AtlasError, Result};
use crate::models::ClassifiedUnit;
use crate::pipeline::{ColorAssignment, MapFrame, ValueScale};

/// Everything a composer needs to render one map.
#[derive(Debug, Clone)]
pub struct MapRequest<'a> {
    pub units: &'a [ClassifiedUnit],
    /// Colors keyed by unit code
    pub colors: &'a ColorAssignment,
    pub frame: MapFrame,
    pub style: Style,
    /// Display name of the reference unit, for legend text
    pub reference_name: Option<&'a str>,
    /// Value range behind the colors of a choropleth; drawn as a graded legend
    pub scale: Option<&'a ValueScale>,
}

/// Renders classified units to a self-contained document.
pub trait MapComposer {
    fn compose(&self, request: &MapRequest<'_>) -> Result<String>;

    /// File extension of the rendered document
    fn extension(&self) -> &'static str;
}

/// A bare file name: non-empty, a single path component, not `.` or `..`.
pub fn check_file_name(file_name: &str) -> Result<()> {
    let valid = Path::new(file_name)
        .file_name()
        .map_or(false, |name| name == OsStr::new(file_name));
    if !valid {
        return Err(AtlasError::invalid(format!("invalid output file name '{}'", file_name)));
    }
    Ok(())
}

/// Write every `(file_name, contents)` pair into `dir` as one unit.
///
/// All names are checked and all contents written to temporary files in
/// `dir` before anything is persisted. If a persist fails, files already
/// moved into place by this call are removed again.
pub fn write_atomic_all(dir: &Path, files: &[(&str, &[u8])]) -> Result<Vec<PathBuf>> {
    for (i, (name, _)) in files.iter().enumerate() {
        check_file_name(name)?;
        if files[..i].iter().any(|(other, _)| other == name) {
            return Err(AtlasError::invalid(format!("output file '{}' given twice", name)));
        }
    }

    fs::create_dir_all(dir)?;

    let mut staged = Vec::with_capacity(files.len());
    for (name, contents) in files {
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(contents)?;
        tmp.flush()?;
        staged.push((tmp, dir.join(name), contents.len()));
    }

    let mut written: Vec<PathBuf> = Vec::with_capacity(staged.len());
    for (tmp, target, len) in staged {
        if let Err(e) = tmp.persist(&target) {
            for path in &written {
                let _ = fs::remove_file(path);
            }
            return Err(AtlasError::Io(e.error));
        }
        info!("Wrote {} ({} bytes)", target.display(), len);
        written.push(target);
    }

    Ok(written)
}

/// Write `contents` to `dir/file_name` via a temporary file in the same
/// directory, so a failed run never leaves a partial file behind.
pub fn write_atomic(dir: &Path, file_name: &str, contents: &[u8]) -> Result<PathBuf> {
    let mut written = write_atomic_all(dir, &[(file_name, contents)])?;
    written
        .pop()
        .ok_or_else(|| AtlasError::invalid("nothing was written"))
}
