//! The end-to-end driver: fetch, harden, submit, collect, record.
//!
//! Steps run strictly in order and the first failure stops the run. Nothing
//! a step created is rolled back. The fetched project directory and whatever
//! the external tools produced inside it are left for inspection.

mod step;

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::command::{CommandError, ExternalCommand};
use crate::config::Config;
use crate::copy::{ArtifactCopier, CopyError};
use crate::fetch::{Cloner, FetchError, FetchedProject, Fetcher, GitCloner};
use crate::manifest::ManifestLog;
use crate::models::{CopyReport, ManifestEntry};
use crate::sound::{self, Cue};

pub use step::{Step, StepDescription};

/// Directory inside the project that the support tools are cloned into.
pub const TOOLS_DIR: &str = "tt";

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Copy(#[from] CopyError),

    #[error("{failed} of {attempted} copy operations failed")]
    CopyIncomplete { failed: usize, attempted: usize },
}

/// A pipeline run that stopped at `step`.
#[derive(Debug, Error)]
#[error("Step '{step}' failed: {source}")]
pub struct PipelineError {
    pub step: Step,
    #[source]
    pub source: StepError,
    /// The fetched project, kept for inspection, if the run got that far.
    pub project_dir: Option<PathBuf>,
}

impl PipelineError {
    fn new(step: Step, source: impl Into<StepError>, project_dir: Option<&Path>) -> Self {
        Self {
            step,
            source: source.into(),
            project_dir: project_dir.map(Path::to_path_buf),
        }
    }
}

/// Everything the driver needs to know, with every external command replaceable.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory projects are cloned into and the manifest is kept in.
    pub workdir: PathBuf,
    /// Copy destination root; relative paths resolve against the project directory.
    pub projects_dir: PathBuf,
    pub clone_tools: ExternalCommand,
    pub configure: ExternalCommand,
    pub harden: ExternalCommand,
    pub submission: ExternalCommand,
    pub step_timeout: Option<Duration>,
    pub sound: bool,
}

impl PipelineConfig {
    pub fn new(config: &Config, workdir: impl Into<PathBuf>) -> Self {
        let tt_tool = |flag: &str| {
            ExternalCommand::new("python3", [format!("{}/tt_tool.py", TOOLS_DIR), flag.to_string()])
        };

        Self {
            workdir: workdir.into(),
            projects_dir: config.projects_dir.clone(),
            clone_tools: ExternalCommand::new("git", ["clone", config.tools_url.as_str(), TOOLS_DIR]),
            configure: tt_tool("--create-user-config"),
            harden: tt_tool("--harden"),
            submission: tt_tool("--create-tt-submission"),
            step_timeout: config.step_timeout,
            sound: config.sound,
        }
    }

    /// The command run for an external step.
    pub fn command(&self, step: Step) -> Option<&ExternalCommand> {
        match step {
            Step::CloneTools => Some(&self.clone_tools),
            Step::Configure => Some(&self.configure),
            Step::Harden => Some(&self.harden),
            Step::Submission => Some(&self.submission),
            Step::Fetch | Step::Copy | Step::Manifest => None,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub project: FetchedProject,
    pub copy_report: CopyReport,
    /// Where the manifest row was written; `None` if appending failed.
    pub manifest_path: Option<PathBuf>,
}

pub struct Pipeline<C = GitCloner> {
    config: PipelineConfig,
    fetcher: Fetcher<C>,
}

impl Pipeline<GitCloner> {
    pub fn new(config: PipelineConfig) -> Self {
        let cloner = GitCloner::new(config.step_timeout);
        Self::with_cloner(config, cloner)
    }
}

impl<C: Cloner> Pipeline<C> {
    pub fn with_cloner(config: PipelineConfig, cloner: C) -> Self {
        let fetcher = Fetcher::new(cloner, config.workdir.clone());
        Self { config, fetcher }
    }

    /// The steps a run performs, with the concrete external commands.
    pub fn describe(&self) -> Vec<StepDescription> {
        Step::ALL
            .iter()
            .map(|&step| StepDescription {
                step,
                command: self.config.command(step).map(ToString::to_string),
            })
            .collect()
    }

    /// Run every step for `url`, playing the matching cue at the end.
    pub async fn run(&self, url: &str) -> Result<PipelineOutcome, PipelineError> {
        tracing::info!("Starting TinyTapeout project processing for {}", url);
        tracing::info!("Working directory: {}", self.config.workdir.display());

        let result = self.execute(url).await;

        match &result {
            Ok(outcome) => {
                tracing::info!(
                    "TinyTapeout project setup completed successfully: {}",
                    outcome.project.name
                );
            }
            Err(e) => {
                tracing::error!("{}", e);
                if let Some(ref dir) = e.project_dir {
                    tracing::error!(
                        "Project directory {} was left in place; inspect it before retrying",
                        dir.display()
                    );
                }
            }
        }

        if self.config.sound {
            sound::play(if result.is_ok() { Cue::Success } else { Cue::Error }).await;
        }

        result
    }

    async fn execute(&self, url: &str) -> Result<PipelineOutcome, PipelineError> {
        banner(Step::Fetch, None);
        let project = self
            .fetcher
            .fetch(url, None)
            .await
            .map_err(|e| PipelineError::new(Step::Fetch, e, None))?;
        tracing::info!("Project directory: {}", project.path.display());

        for step in [Step::CloneTools, Step::Configure, Step::Harden, Step::Submission] {
            let Some(command) = self.config.command(step) else {
                continue;
            };
            let command = command.clone().in_dir(&project.path);
            banner(step, Some(&command));

            match command.run(self.config.step_timeout).await {
                Ok(output) => {
                    tracing::info!("Step '{}' succeeded", step);
                    if !output.stdout.trim().is_empty() {
                        tracing::debug!("Output: {}", output.stdout.trim_end());
                    }
                }
                Err(e) => {
                    if let Some(text) = e.output().filter(|t| !t.is_empty()) {
                        tracing::error!("Output of '{}':\n{}", step, text);
                    }
                    return Err(PipelineError::new(step, e, Some(&project.path)));
                }
            }
        }

        banner(Step::Copy, None);
        let projects_dir = project.path.join(&self.config.projects_dir);
        let copy_report = ArtifactCopier::new(projects_dir)
            .copy(&project.path, &project.name)
            .map_err(|e| PipelineError::new(Step::Copy, e, Some(&project.path)))?;
        if !copy_report.is_success() {
            return Err(PipelineError::new(
                Step::Copy,
                StepError::CopyIncomplete {
                    failed: copy_report.failed(),
                    attempted: copy_report.attempted(),
                },
                Some(&project.path),
            ));
        }

        banner(Step::Manifest, None);
        let log = ManifestLog::new(&self.config.workdir);
        let entry = ManifestEntry::completed(&project.name, url, &project.name);
        let manifest_path = match log.append(&entry) {
            Ok(()) => Some(log.path().to_path_buf()),
            Err(e) => {
                tracing::error!("Failed to update project manifest: {}. Continuing...", e);
                None
            }
        };

        Ok(PipelineOutcome {
            project,
            copy_report,
            manifest_path,
        })
    }
}

fn banner(step: Step, command: Option<&ExternalCommand>) {
    tracing::info!("{}", "=".repeat(60));
    tracing::info!("Step {}: {}", step.number(), step.summary());
    if let Some(command) = command {
        tracing::info!("Command: {}", command);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_commands() {
        let config = PipelineConfig::new(&Config::default(), "/work");
        assert_eq!(
            config.clone_tools.to_string(),
            "git clone https://github.com/TinyTapeout/tt-support-tools.git tt"
        );
        assert_eq!(
            config.configure.to_string(),
            "python3 tt/tt_tool.py --create-user-config"
        );
        assert_eq!(config.harden.to_string(), "python3 tt/tt_tool.py --harden");
        assert_eq!(
            config.submission.to_string(),
            "python3 tt/tt_tool.py --create-tt-submission"
        );
    }

    #[test]
    fn test_describe_lists_steps_in_order() {
        let pipeline = Pipeline::new(PipelineConfig::new(&Config::default(), "/work"));
        let steps = pipeline.describe();
        let order: Vec<Step> = steps.iter().map(|d| d.step).collect();
        assert_eq!(order, Step::ALL.to_vec());
        assert!(steps[0].command.is_none());
        assert_eq!(
            steps[3].command.as_deref(),
            Some("python3 tt/tt_tool.py --harden")
        );
    }
}
