use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use engine_logging::engine_info;
use enricher_core::{MergedRow, OUTPUT_COLUMNS};
use tempfile::NamedTempFile;

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output directory {path} is unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("output path {0} has no file name")]
    NoFileName(PathBuf),
}

/// Render rows as CSV with the fixed header, even when there are no rows.
pub fn render_csv(rows: &[MergedRow]) -> Result<Vec<u8>, OutputError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(OUTPUT_COLUMNS)?;
    for row in rows {
        writer.serialize(row.to_record())?;
    }
    writer.into_inner().map_err(|err| OutputError::Io(err.into_error()))
}

/// Writes the enriched table to one target file.
///
/// The CSV is staged in a temp file next to the target and renamed over it,
/// so an interrupted run leaves the previous output in place.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    target: PathBuf,
    dir: PathBuf,
}

impl OutputWriter {
    pub fn new(target: &Path) -> Result<Self, OutputError> {
        if target.file_name().is_none() {
            return Err(OutputError::NoFileName(target.to_path_buf()));
        }
        let dir = target
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(Self {
            target: target.to_path_buf(),
            dir,
        })
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Render `rows` and replace the target file with them.
    pub fn write(&self, rows: &[MergedRow]) -> Result<PathBuf, OutputError> {
        let content = render_csv(rows)?;
        self.prepare_dir()?;

        let mut staged = NamedTempFile::new_in(&self.dir)?;
        staged.write_all(&content)?;
        staged.as_file_mut().sync_all()?;
        staged
            .persist(&self.target)
            .map_err(|err| OutputError::Io(err.error))?;

        engine_info!("Wrote {} rows to {:?}", rows.len(), self.target);
        Ok(self.target.clone())
    }

    fn prepare_dir(&self) -> Result<(), OutputError> {
        let unusable = |reason: String| OutputError::OutputDir {
            path: self.dir.clone(),
            reason,
        };
        match fs::metadata(&self.dir) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(unusable("not a directory".to_string())),
            Err(_) => fs::create_dir_all(&self.dir).map_err(|err| unusable(err.to_string())),
        }
    }
}

/// Write `rows` to `path` and return the written path.
pub fn write_output(path: &Path, rows: &[MergedRow]) -> Result<PathBuf, OutputError> {
    OutputWriter::new(path)?.write(rows)
}
