use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tt_project::config::Config;
use tt_project::copy::{self, ArtifactCopier};
use tt_project::fetch::{FetchError, Fetcher, GitCloner};
use tt_project::manifest::ManifestLog;
use tt_project::metadata;
use tt_project::pipeline::{Pipeline, PipelineConfig, PipelineError, Step, StepError};

/// Exit status for an unusable URL or a failed clone.
const EXIT_CLONE: u8 = 2;
/// Exit status for missing or invalid `info.yaml`.
const EXIT_METADATA: u8 = 3;
/// Exit status for a failed external step.
const EXIT_STEP: u8 = 4;
/// Exit status for a copy with failed items.
const EXIT_COPY: u8 = 5;

#[derive(Parser)]
#[command(name = "ttp")]
#[command(about = "Fetch, harden and collect Tiny Tapeout projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clone a project and rename it based on its type (wokwi or verilog)
    Fetch {
        /// Repository URL to clone
        #[arg(required_unless_present = "test")]
        github_url: Option<String>,

        /// Final directory name (default: derived from info.yaml)
        #[arg(long)]
        target_dir: Option<String>,

        /// Check info.yaml parsing against built-in samples and exit
        #[arg(long)]
        test: bool,
    },
    /// Run the whole fetch, harden, submit and copy pipeline for a project
    Process {
        /// Repository URL to clone and process
        #[arg(required_unless_present = "help_steps")]
        github_url: Option<String>,

        /// Show detailed step information and exit
        #[arg(long)]
        help_steps: bool,

        /// Kill any external step running longer than this many seconds
        #[arg(long, value_name = "SECS")]
        step_timeout: Option<u64>,

        /// Support tools repository to clone into tt/
        #[arg(long, value_name = "URL")]
        tools_url: Option<String>,

        /// Projects directory for the copy step
        #[arg(short, long)]
        projects_dir: Option<PathBuf>,

        /// Don't play a sound when the run finishes
        #[arg(long)]
        no_sound: bool,
    },
    /// Copy files from a hardened project into the projects directory
    Copy {
        /// Source directory containing the hardened project
        #[arg(short, long, default_value = ".")]
        source: PathBuf,

        /// Project name (default: from info.yaml, else the source directory name)
        #[arg(short, long)]
        name: Option<String>,

        /// Projects directory (default: 'projects' or TINYTAPEOUT_PROJECTS_DIR)
        #[arg(short, long)]
        projects_dir: Option<PathBuf>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },
    /// List projects recorded in the manifest
    Manifest {
        /// Directory containing project_manifest.csv
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
}

/// Initialize tracing on stderr so stdout only carries results.
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "tt_project=debug"
    } else {
        "tt_project=info"
    };
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let verbose = matches!(cli.command, Commands::Copy { verbose: true, .. });
    init_tracing(verbose);

    let config = Config::from_env();
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Fetch {
            github_url,
            target_dir,
            test,
        } => {
            if test {
                return Ok(run_self_test());
            }
            let Some(url) = github_url else {
                anyhow::bail!("a repository URL is required");
            };

            let fetcher = Fetcher::new(GitCloner::new(config.step_timeout), &cwd);
            match fetcher.fetch(&url, target_dir.as_deref()).await {
                Ok(project) => {
                    println!("Success! Project cloned and renamed to: {}", project.name);
                    println!("Full path: {}", project.path.display());
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    Ok(ExitCode::from(fetch_exit_code(&e)))
                }
            }
        }
        Commands::Process {
            github_url,
            help_steps,
            step_timeout,
            tools_url,
            projects_dir,
            no_sound,
        } => {
            let mut config = config;
            if let Some(secs) = step_timeout {
                config.step_timeout = (secs > 0).then(|| Duration::from_secs(secs));
            }
            if let Some(url) = tools_url {
                config.tools_url = url;
            }
            if let Some(dir) = projects_dir {
                config.projects_dir = dir;
            }
            if no_sound {
                config.sound = false;
            }

            let pipeline = Pipeline::new(PipelineConfig::new(&config, &cwd));

            if help_steps {
                print_steps(&pipeline);
                return Ok(ExitCode::SUCCESS);
            }
            let Some(url) = github_url else {
                anyhow::bail!("a repository URL is required");
            };

            match pipeline.run(&url).await {
                Ok(outcome) => {
                    println!("Project ready: {}", outcome.project.path.display());
                    println!("Artifacts: {}", outcome.copy_report.destination.display());
                    if let Some(path) = outcome.manifest_path {
                        println!("Manifest: {}", path.display());
                    }
                    println!();
                    println!("Next steps:");
                    println!("- Review the generated files");
                    println!("- Test your project");
                    println!("- Submit to TinyTapeout if ready");
                    Ok(ExitCode::SUCCESS)
                }
                Err(e) => Ok(ExitCode::from(pipeline_exit_code(&e))),
            }
        }
        Commands::Copy {
            source,
            name,
            projects_dir,
            verbose: _,
        } => {
            let source = absolute(&cwd, &source);
            let projects_dir = absolute(&cwd, &projects_dir.unwrap_or(config.projects_dir));
            let name = copy::resolve_project_name(&source, name.as_deref());

            match ArtifactCopier::new(projects_dir).copy(&source, &name) {
                Ok(report) => {
                    println!(
                        "Successful operations: {}/{}",
                        report.succeeded(),
                        report.attempted()
                    );
                    println!("Project directory: {}", report.destination.display());
                    if report.is_success() {
                        println!("Project copied successfully! You can now integrate it with TinyTapeout.");
                        Ok(ExitCode::SUCCESS)
                    } else {
                        println!(
                            "{} operations failed. Please check the output above for details.",
                            report.failed()
                        );
                        Ok(ExitCode::from(EXIT_COPY))
                    }
                }
                Err(e) => {
                    tracing::error!("{}", e);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Manifest { dir } => {
            let log = ManifestLog::new(absolute(&cwd, &dir));
            let entries = log.entries()?;
            if entries.is_empty() {
                println!("No projects recorded in {}", log.path().display());
            }
            for entry in entries {
                println!(
                    "{}  {:<40} {:<10} {}",
                    entry.processed_date.format("%Y-%m-%d %H:%M"),
                    entry.project_name,
                    entry.status.as_str(),
                    entry.github_url
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_self_test() -> ExitCode {
    println!("Running YAML parsing test...");
    let checks = metadata::self_test();
    for check in &checks {
        match &check.result {
            Ok(name) if check.passed() => {
                println!("{} test successful: derived name = {}", check.language, name)
            }
            Ok(name) => println!(
                "{} test failed: expected {}, got {}",
                check.language, check.expected, name
            ),
            Err(e) => println!("{} test failed: {}", check.language, e),
        }
    }

    if checks.iter().all(|c| c.passed()) {
        println!("All tests passed!");
        ExitCode::SUCCESS
    } else {
        println!("Test failed!");
        ExitCode::FAILURE
    }
}

fn print_steps<C: tt_project::fetch::Cloner>(pipeline: &Pipeline<C>) {
    println!("TinyTapeout Project Processing Steps:");
    for description in pipeline.describe() {
        let step = description.step;
        println!("{}. {}", step.number(), step.summary());
        if let Some(command) = description.command {
            println!("   Command: {}", command);
        }
        println!("   {}", step.details());
    }
    println!();
    println!("Usage: ttp process <github_url>");
}

fn fetch_exit_code(e: &FetchError) -> u8 {
    match e {
        FetchError::Metadata(_) => EXIT_METADATA,
        _ => EXIT_CLONE,
    }
}

fn pipeline_exit_code(e: &PipelineError) -> u8 {
    match (&e.step, &e.source) {
        (_, StepError::Fetch(fetch)) => fetch_exit_code(fetch),
        (Step::Copy, _) => EXIT_COPY,
        _ => EXIT_STEP,
    }
}

fn absolute(cwd: &Path, path: &Path) -> PathBuf {
    let joined = cwd.join(path);
    std::fs::canonicalize(&joined).unwrap_or(joined)
}
