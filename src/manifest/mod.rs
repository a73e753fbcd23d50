//! The processed-projects manifest, an append-only CSV log.
//!
//! Each pipeline run opens the file, appends one row and closes it again.
//! Existing rows are never rewritten.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::ManifestEntry;

/// File name of the manifest inside its directory.
pub const MANIFEST_FILE: &str = "project_manifest.csv";

/// Column order of the manifest.
pub const COLUMNS: [&str; 5] = [
    "project_name",
    "github_url",
    "project_directory",
    "processed_date",
    "status",
];

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Failed to access manifest {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed manifest {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

#[derive(Debug, Clone)]
pub struct ManifestLog {
    path: PathBuf,
}

impl ManifestLog {
    /// Manifest stored as [`MANIFEST_FILE`] inside `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(MANIFEST_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> ManifestError {
        ManifestError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_err(&self, source: csv::Error) -> ManifestError {
        ManifestError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    /// Append one row, writing the header first if the file is new or empty.
    pub fn append(&self, entry: &ManifestEntry) -> Result<(), ManifestError> {
        let needs_header = std::fs::metadata(&self.path)
            .map(|m| m.len() == 0)
            .unwrap_or(true);

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_err(e))?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(needs_header)
            .from_writer(file);
        writer.serialize(entry).map_err(|e| self.csv_err(e))?;
        writer.flush().map_err(|e| self.io_err(e))?;

        tracing::info!(
            "Added project entry for {} to {}",
            entry.project_name,
            self.path.display()
        );
        Ok(())
    }

    /// All rows, oldest first. A missing file has no entries.
    pub fn entries(&self) -> Result<Vec<ManifestEntry>, ManifestError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut reader = csv::Reader::from_path(&self.path).map_err(|e| self.csv_err(e))?;
        reader
            .deserialize::<ManifestEntry>()
            .collect::<Result<Vec<ManifestEntry>, _>>()
            .map_err(|e| self.csv_err(e))
    }
}
