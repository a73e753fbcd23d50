//! Cloning a project repository and renaming it after its metadata.
//!
//! The clone lands in a temporary directory named after the repository (or
//! the explicit target). It is then renamed to the canonical project name
//! from `info.yaml`. Until the rename succeeds the clone is owned by a
//! [`CloneGuard`], so no half-processed directory survives a failure.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::command::{CommandError, ExternalCommand};
use crate::metadata::{self, MetadataError};
use crate::models::{ProjectInfo, ProjectKind};

/// URL prefixes accepted as repository references.
const URL_PREFIXES: &[&str] = &["http://", "https://", "git@"];

/// Errors from fetching a project.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Not a valid repository URL: {0}")]
    InvalidUrl(String),

    #[error("Directory '{}' already exists", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Failed to clone repository: {0}")]
    Clone(#[from] CommandError),

    #[error("Failed to extract project information: {0}")]
    Metadata(#[from] MetadataError),

    #[error("'{0}' is not usable as a directory name")]
    InvalidName(String),

    #[error("Failed to rename directory: {0}")]
    Rename(#[source] std::io::Error),
}

/// Clones a repository into a local directory.
pub trait Cloner {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<(), CommandError>> + Send;
}

/// [`Cloner`] backed by `git clone`.
#[derive(Debug, Clone, Default)]
pub struct GitCloner {
    pub timeout: Option<Duration>,
}

impl GitCloner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl Cloner for GitCloner {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), CommandError> {
        let dest = dest.to_string_lossy();
        ExternalCommand::new("git", ["clone", url, &*dest])
            .run(self.timeout)
            .await?;
        Ok(())
    }
}

/// Check that `url` looks like a repository reference we can clone.
pub fn validate_repo_url(url: &str) -> Result<(), FetchError> {
    let url = url.trim();
    if !URL_PREFIXES.iter().any(|p| url.starts_with(p)) || repo_name_from_url(url).is_none() {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    Ok(())
}

/// Repository name from a URL: the last path segment without `.git`.
///
/// Handles both `https://host/owner/repo.git` and `git@host:owner/repo.git`.
pub fn repo_name_from_url(url: &str) -> Option<String> {
    let url = url.trim();
    let path = if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        rest.split_once('/').map(|(_, path)| path)?
    } else {
        url.split_once(':').map(|(_, path)| path)?
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    path.rsplit('/')
        .next()
        .filter(|name| is_valid_dir_name(name))
        .map(str::to_string)
}

/// A single, non-special path component.
fn is_valid_dir_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

/// A cloned and renamed project.
#[derive(Debug, Clone)]
pub struct FetchedProject {
    /// Final directory name.
    pub name: String,
    /// Full path of the project directory.
    pub path: PathBuf,
    pub info: ProjectInfo,
    pub kind: ProjectKind,
}

/// Removes a cloned directory on drop unless [`keep`](CloneGuard::keep) was called.
struct CloneGuard {
    path: PathBuf,
    armed: bool,
}

impl CloneGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    /// Point the guard at the renamed directory.
    fn moved_to(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn keep(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for CloneGuard {
    fn drop(&mut self) {
        if self.armed && self.path.exists() {
            tracing::info!("Cleaning up {}", self.path.display());
            if let Err(e) = std::fs::remove_dir_all(&self.path) {
                tracing::error!("Failed to remove {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Clones projects into `workdir`.
#[derive(Debug, Clone)]
pub struct Fetcher<C = GitCloner> {
    cloner: C,
    workdir: PathBuf,
}

impl<C: Cloner> Fetcher<C> {
    pub fn new(cloner: C, workdir: impl Into<PathBuf>) -> Self {
        Self {
            cloner,
            workdir: workdir.into(),
        }
    }

    pub fn cloner(&self) -> &C {
        &self.cloner
    }

    /// Clone `url` and rename it to its canonical project name.
    ///
    /// An explicit `target_dir` is used as the final name instead of the
    /// derived one, but `info.yaml` must still be valid.
    pub async fn fetch(
        &self,
        url: &str,
        target_dir: Option<&str>,
    ) -> Result<FetchedProject, FetchError> {
        let url = url.trim();
        validate_repo_url(url)?;

        let clone_name = match target_dir {
            Some(name) if is_valid_dir_name(name) => name.to_string(),
            Some(name) => return Err(FetchError::InvalidName(name.to_string())),
            None => repo_name_from_url(url).ok_or_else(|| FetchError::InvalidUrl(url.to_string()))?,
        };

        let clone_path = self.workdir.join(&clone_name);
        if clone_path.exists() {
            return Err(FetchError::AlreadyExists(clone_path));
        }

        tracing::info!("Cloning repository: {}", url);
        let mut guard = CloneGuard::new(clone_path);
        self.cloner.clone_repo(url, guard.path()).await?;
        tracing::info!("Successfully cloned to: {}", guard.path().display());

        let (info, kind) = metadata::derive_project_name(guard.path())?;

        let name = match target_dir {
            Some(name) => name.to_string(),
            None => kind.directory_name(),
        };
        if !is_valid_dir_name(&name) {
            return Err(FetchError::InvalidName(name));
        }

        let final_path = self.workdir.join(&name);
        if final_path != guard.path() {
            if final_path.exists() {
                tracing::warn!(
                    "Directory {} already exists. Removing it first.",
                    final_path.display()
                );
                std::fs::remove_dir_all(&final_path).map_err(FetchError::Rename)?;
            }
            std::fs::rename(guard.path(), &final_path).map_err(FetchError::Rename)?;
            guard.moved_to(final_path);
            tracing::info!("Renamed directory to: {}", guard.path().display());
        }

        Ok(FetchedProject {
            name,
            path: guard.keep(),
            info,
            kind,
        })
    }
}
