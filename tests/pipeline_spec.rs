//! Pipeline driver tests.
//!
//! External tools are replaced by `sh` one-liners and `git clone` by a
//! cloner that writes an already-hardened project, so a run exercises the
//! real sequencing, copy and manifest code without network access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::TempDir;
use tt_project::command::{CommandError, ExternalCommand};
use tt_project::config::Config;
use tt_project::fetch::{Cloner, FetchError};
use tt_project::manifest::{ManifestLog, MANIFEST_FILE};
use tt_project::models::EntryStatus;
use tt_project::pipeline::{Pipeline, PipelineConfig, Step, StepError};

const URL: &str = "https://github.com/user/tt-full-adder.git";
const PROJECT: &str = "tt_um_full_adder";

/// Writes a project tree that already contains the submission outputs.
struct HardenedCloner {
    with_stats: bool,
}

fn io_err(source: std::io::Error) -> CommandError {
    CommandError::Spawn {
        command: "fixture clone".to_string(),
        source,
    }
}

fn write(path: &Path, contents: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)
}

impl Cloner for HardenedCloner {
    async fn clone_repo(&self, _url: &str, dest: &Path) -> Result<(), CommandError> {
        let files = [
            (
                "info.yaml",
                "project:\n  title: Full adder\n  language: Verilog\n  top_module: tt_um_full_adder\n",
            ),
            ("docs/info.md", "# Full adder, half adder and comparator\n"),
            ("LICENSE", "Apache-2.0\n"),
            ("tt_submission/commit_id.json", r#"{"commit": "feedbeef"}"#),
            ("tt_submission/tt_um_full_adder.gds", "gds"),
            ("tt_submission/tt_um_full_adder.v", "module tt_um_full_adder;"),
        ];
        for (rel, contents) in files {
            write(&dest.join(rel), contents).map_err(io_err)?;
        }
        if self.with_stats {
            write(&dest.join("tt_submission/stats/metrics.csv"), "cells,3\n").map_err(io_err)?;
        }
        Ok(())
    }
}

struct Fixture {
    work: TempDir,
    log: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let work = TempDir::new().expect("Failed to create temp dir");
        let log = work.path().join("steps.log");
        Self { work, log }
    }

    /// A stand-in that records its step name, then exits with `code`.
    fn step(&self, name: &str, code: i32) -> ExternalCommand {
        ExternalCommand::shell(format!(
            "echo {} >> '{}'; exit {}",
            name,
            self.log.display(),
            code
        ))
    }

    fn config(&self) -> PipelineConfig {
        let mut config = PipelineConfig::new(&Config::default(), self.work.path());
        config.projects_dir = self.work.path().join("projects");
        config.clone_tools = self.step("clone-tools", 0);
        config.configure = self.step("configure", 0);
        config.harden = self.step("harden", 0);
        config.submission = self.step("submission", 0);
        config.sound = false;
        config
    }

    fn steps_run(&self) -> Vec<String> {
        std::fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn manifest(&self) -> PathBuf {
        self.work.path().join(MANIFEST_FILE)
    }
}

mod successful_run {
    use super::*;

    #[tokio::test]
    async fn runs_every_step_in_order() {
        let fx = Fixture::new();
        let pipeline = Pipeline::with_cloner(fx.config(), HardenedCloner { with_stats: true });

        let outcome = pipeline.run(URL).await.expect("pipeline failed");

        assert_eq!(outcome.project.name, PROJECT);
        assert_eq!(
            fx.steps_run(),
            vec!["clone-tools", "configure", "harden", "submission"]
        );
        assert!(outcome.copy_report.is_success());
    }

    #[tokio::test]
    async fn runs_external_steps_inside_the_project() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.configure = ExternalCommand::shell("test -f info.yaml");
        let pipeline = Pipeline::with_cloner(config, HardenedCloner { with_stats: true });

        pipeline.run(URL).await.expect("pipeline failed");
    }

    #[tokio::test]
    async fn copies_artifacts_and_appends_manifest_entry() {
        let fx = Fixture::new();
        let pipeline = Pipeline::with_cloner(fx.config(), HardenedCloner { with_stats: true });

        let outcome = pipeline.run(URL).await.expect("pipeline failed");

        let copied = fx.work.path().join("projects").join(PROJECT);
        assert!(copied.join("tt_um_full_adder.gds").is_file());
        assert!(copied.join("stats/metrics.csv").is_file());

        assert_eq!(outcome.manifest_path.as_deref(), Some(fx.manifest().as_path()));
        let entries = ManifestLog::new(fx.work.path()).entries().expect("read manifest");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].project_name, PROJECT);
        assert_eq!(entries[0].github_url, URL);
        assert_eq!(entries[0].project_directory, PROJECT);
        assert_eq!(entries[0].status, EntryStatus::Completed);
    }

    #[tokio::test]
    async fn relative_projects_dir_resolves_inside_the_project() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.projects_dir = PathBuf::from("projects");
        let pipeline = Pipeline::with_cloner(config, HardenedCloner { with_stats: true });

        let outcome = pipeline.run(URL).await.expect("pipeline failed");

        assert_eq!(
            outcome.copy_report.destination,
            outcome.project.path.join("projects").join(PROJECT)
        );
    }
}

mod failing_run {
    use super::*;

    #[tokio::test]
    async fn halts_at_the_first_failing_step() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.harden = fx.step("harden", 1);
        let pipeline = Pipeline::with_cloner(config, HardenedCloner { with_stats: true });

        let err = pipeline.run(URL).await.unwrap_err();

        assert_eq!(err.step, Step::Harden);
        assert!(matches!(err.source, StepError::Command(CommandError::Failed { .. })));
        assert_eq!(fx.steps_run(), vec!["clone-tools", "configure", "harden"]);
        assert!(!fx.work.path().join("projects").exists());
        assert!(!fx.manifest().exists());
    }

    #[tokio::test]
    async fn leaves_the_project_directory_for_inspection() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.submission = ExternalCommand::shell("echo 'DRC failed' >&2; exit 2");
        let pipeline = Pipeline::with_cloner(config, HardenedCloner { with_stats: true });

        let err = pipeline.run(URL).await.unwrap_err();

        assert_eq!(err.step, Step::Submission);
        let dir = err.project_dir.clone().expect("project dir");
        assert_eq!(dir, fx.work.path().join(PROJECT));
        assert!(dir.join("info.yaml").is_file());
        match err.source {
            StepError::Command(ref e) => {
                assert_eq!(e.output().as_deref(), Some("DRC failed"))
            }
            ref other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn reports_a_timed_out_step() {
        let fx = Fixture::new();
        let mut config = fx.config();
        config.configure = ExternalCommand::shell("sleep 5");
        config.step_timeout = Some(Duration::from_millis(200));
        let pipeline = Pipeline::with_cloner(config, HardenedCloner { with_stats: true });

        let err = pipeline.run(URL).await.unwrap_err();

        assert_eq!(err.step, Step::Configure);
        assert!(matches!(err.source, StepError::Command(CommandError::TimedOut { .. })));
        assert!(!fx.manifest().exists());
    }

    #[tokio::test]
    async fn fails_the_copy_step_when_a_required_item_is_missing() {
        let fx = Fixture::new();
        let pipeline = Pipeline::with_cloner(fx.config(), HardenedCloner { with_stats: false });

        let err = pipeline.run(URL).await.unwrap_err();

        assert_eq!(err.step, Step::Copy);
        assert!(matches!(
            err.source,
            StepError::CopyIncomplete { failed: 1, .. }
        ));
        assert!(!fx.manifest().exists());
    }

    #[tokio::test]
    async fn rejects_a_bad_url_before_running_anything() {
        let fx = Fixture::new();
        let pipeline = Pipeline::with_cloner(fx.config(), HardenedCloner { with_stats: true });

        let err = pipeline.run("not-a-url").await.unwrap_err();

        assert_eq!(err.step, Step::Fetch);
        assert!(matches!(err.source, StepError::Fetch(FetchError::InvalidUrl(_))));
        assert!(err.project_dir.is_none());
        assert!(fx.steps_run().is_empty());
    }
}

mod manifest_log {
    use super::*;

    #[tokio::test]
    async fn appends_one_row_per_run() {
        let fx = Fixture::new();
        let pipeline = Pipeline::with_cloner(fx.config(), HardenedCloner { with_stats: true });

        pipeline.run(URL).await.expect("first run failed");
        // The first clone was renamed, so its clone name is free again.
        pipeline.run(URL).await.expect("second run failed");

        let entries = ManifestLog::new(fx.work.path()).entries().expect("read manifest");
        assert_eq!(entries.len(), 2);
        let text = std::fs::read_to_string(fx.manifest()).unwrap();
        assert_eq!(text.matches("project_name,github_url").count(), 1);
    }
}
