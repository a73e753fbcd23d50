//! Collecting the outputs of a hardened project into a projects tree.
//!
//! Copying is best-effort: every item is attempted and recorded in a
//! [`CopyReport`], and a missing or failed item never stops the rest. Running
//! the copy again over the same source and destination produces the same
//! tree, so a partial copy is fixed by re-running once the source is fixed.

mod commit_id;

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::metadata::{self, INFO_YAML};
use crate::models::{CopyOutcome, CopyReport, Requirement, USER_MODULE_PREFIX};

pub use commit_id::{ensure_sort_id, read_sort_id, CommitIdError, SORT_ID};

/// Directory the submission step writes its outputs to.
pub const SUBMISSION_DIR: &str = "tt_submission";

/// A fixed item copied from the source tree.
#[derive(Debug, Clone, Copy)]
pub struct CopyItem {
    pub source: &'static str,
    pub destination: &'static str,
    pub requirement: Requirement,
}

const fn required(source: &'static str, destination: &'static str) -> CopyItem {
    CopyItem {
        source,
        destination,
        requirement: Requirement::Required,
    }
}

pub const COMMIT_ID_SOURCE: &str = "tt_submission/commit_id.json";

pub const ITEMS: &[CopyItem] = &[
    required("docs/info.md", "docs/info.md"),
    required("tt_submission/stats", "stats"),
    required("LICENSE", "LICENSE"),
    required(COMMIT_ID_SOURCE, "commit_id.json"),
    required(INFO_YAML, INFO_YAML),
    CopyItem {
        source: "wokwi-diagram.json",
        destination: "wokwi-diagram.json",
        requirement: Requirement::Optional,
    },
];

/// Design artifacts collected from [`SUBMISSION_DIR`], by extension.
pub const ARTIFACT_PATTERNS: &[(&str, &str)] = &[
    ("*.gds", "GDS files"),
    ("*.lef", "LEF files"),
    ("*.oas", "OAS files"),
    ("*.v", "Verilog files"),
];

/// Errors that prevent a copy from starting.
#[derive(Debug, Error)]
pub enum CopyError {
    #[error("Source directory '{}' does not exist", .0.display())]
    SourceMissing(PathBuf),

    #[error("Failed to create destination '{}': {source}", .path.display())]
    Destination {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pick the destination project name.
///
/// Precedence: `explicit`, then the name derived from the source's
/// `info.yaml`, then the source directory's own name.
pub fn resolve_project_name(source: &Path, explicit: Option<&str>) -> String {
    if let Some(name) = explicit.filter(|n| !n.trim().is_empty()) {
        return name.trim().to_string();
    }

    if source.join(INFO_YAML).is_file() {
        match metadata::read_info_yaml(source).and_then(|info| info.kind()) {
            Ok(kind) => return kind.directory_name(),
            Err(e) => tracing::warn!("Ignoring {} for naming: {}", INFO_YAML, e),
        }
    }

    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

/// Copies hardened projects into `projects_dir/<name>`.
#[derive(Debug, Clone)]
pub struct ArtifactCopier {
    projects_dir: PathBuf,
}

impl ArtifactCopier {
    pub fn new(projects_dir: impl Into<PathBuf>) -> Self {
        Self {
            projects_dir: projects_dir.into(),
        }
    }

    /// Copy every known item from `source` into the project directory `name`.
    pub fn copy(&self, source: &Path, name: &str) -> Result<CopyReport, CopyError> {
        if !source.is_dir() {
            return Err(CopyError::SourceMissing(source.to_path_buf()));
        }

        if !name.starts_with(USER_MODULE_PREFIX) {
            tracing::warn!(
                "Project name '{}' doesn't follow TinyTapeout naming convention (should start with '{}')",
                name,
                USER_MODULE_PREFIX
            );
        }

        let destination = self.projects_dir.join(name);
        std::fs::create_dir_all(&destination).map_err(|e| CopyError::Destination {
            path: destination.clone(),
            source: e,
        })?;

        tracing::info!(
            "Copying hardened project from '{}' to '{}'",
            source.display(),
            destination.display()
        );

        let mut report = CopyReport::new(destination.clone());

        for item in ITEMS {
            let src = source.join(item.source);
            let dst = destination.join(item.destination);

            if !src.exists() {
                match item.requirement {
                    Requirement::Required => {
                        tracing::warn!("Required file/directory not found: {}", src.display());
                        report.push(src, dst, CopyOutcome::MissingRequired);
                    }
                    Requirement::Optional => {
                        tracing::debug!("Optional file not found: {}", src.display());
                        report.push(src, dst, CopyOutcome::SkippedOptional);
                    }
                }
                continue;
            }

            let previous_sort_id = if item.source == COMMIT_ID_SOURCE {
                read_sort_id(&dst)
            } else {
                None
            };

            let outcome = copy_path(&src, &dst);
            if outcome == CopyOutcome::Copied && item.source == COMMIT_ID_SOURCE {
                if let Err(e) = ensure_sort_id(&dst, previous_sort_id) {
                    tracing::error!("Error fixing {}: {}", dst.display(), e);
                }
            }
            report.push(src, dst, outcome);
        }

        let submission = source.join(SUBMISSION_DIR);
        for (pattern, description) in ARTIFACT_PATTERNS {
            let files = find_artifacts(&submission, pattern);
            if files.is_empty() {
                tracing::debug!("No {} found in {} directory", description, SUBMISSION_DIR);
                continue;
            }

            tracing::info!("Copying {} ({} files)", description, files.len());
            for src in files {
                let Some(file_name) = src.file_name() else {
                    continue;
                };
                let dst = destination.join(file_name);
                let outcome = copy_path(&src, &dst);
                report.push(src, dst, outcome);
            }
        }

        tracing::info!(
            "Copy operation completed: {}/{} successful operations",
            report.succeeded(),
            report.attempted()
        );
        if !report.is_success() {
            tracing::warn!("{} operations failed", report.failed());
        }

        Ok(report)
    }
}

/// Regular files in `dir` matching `pattern`, sorted by path.
fn find_artifacts(dir: &Path, pattern: &str) -> Vec<PathBuf> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()),
        pattern
    );

    let entries = match glob::glob(&full) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Invalid pattern {}: {}", full, e);
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Skipping unreadable match: {}", e);
                None
            }
        })
        .filter(|path| path.is_file())
        .collect();
    files.sort();

    if !files.is_empty() {
        tracing::debug!("Found {} files matching pattern '{}':", files.len(), pattern);
        for f in &files {
            tracing::debug!("  {}", f.display());
        }
    }
    files
}

/// Copy a file or directory, replacing whatever is at `dst`.
fn copy_path(src: &Path, dst: &Path) -> CopyOutcome {
    let result = if src.is_dir() {
        replace_dir(src, dst)
    } else {
        copy_file(src, dst)
    };

    match result {
        Ok(()) => {
            tracing::info!("Copied {} -> {}", src.display(), dst.display());
            CopyOutcome::Copied
        }
        Err(e) => {
            tracing::error!("Error copying {}: {}", src.display(), e);
            CopyOutcome::Failed(e.to_string())
        }
    }
}

fn copy_file(src: &Path, dst: &Path) -> std::io::Result<()> {
    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(src, dst)?;
    Ok(())
}

fn replace_dir(src: &Path, dst: &Path) -> std::io::Result<()> {
    if dst.is_dir() {
        std::fs::remove_dir_all(dst)?;
    } else if dst.exists() {
        std::fs::remove_file(dst)?;
    }
    copy_dir_recursive(src, dst)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_item_count() {
        let required = ITEMS
            .iter()
            .filter(|i| i.requirement == Requirement::Required)
            .count();
        assert_eq!(required, 5);
    }

    #[test]
    fn test_name_falls_back_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("tt_um_my_adder");
        std::fs::create_dir(&source).unwrap();
        assert_eq!(resolve_project_name(&source, None), "tt_um_my_adder");
    }

    #[test]
    fn test_name_from_info_yaml() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(
            tmp.path().join(INFO_YAML),
            "project:\n  language: Wokwi\n  wokwi_id: 77\n",
        )
        .unwrap();
        assert_eq!(resolve_project_name(tmp.path(), None), "tt_um_wokwi_77");
        assert_eq!(
            resolve_project_name(tmp.path(), Some("tt_um_override")),
            "tt_um_override"
        );
    }

    #[test]
    fn test_invalid_info_yaml_falls_back_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let source = tmp.path().join("tt_um_fallback");
        std::fs::create_dir(&source).unwrap();
        std::fs::write(source.join(INFO_YAML), "project:\n  language: VHDL\n").unwrap();
        assert_eq!(resolve_project_name(&source, None), "tt_um_fallback");
    }

    #[test]
    fn test_find_artifacts_ignores_directories() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("b.v"), "").unwrap();
        std::fs::write(tmp.path().join("a.v"), "").unwrap();
        std::fs::create_dir(tmp.path().join("dir.v")).unwrap();
        let found = find_artifacts(tmp.path(), "*.v");
        assert_eq!(
            found,
            vec![tmp.path().join("a.v"), tmp.path().join("b.v")]
        );
    }
}
