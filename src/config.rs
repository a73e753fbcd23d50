//! Environment-driven configuration.
//!
//! - `TINYTAPEOUT_PROJECTS_DIR` - destination root for copied projects (default: `projects`)
//! - `TT_SUPPORT_TOOLS_URL` - repository cloned as `tt/` inside each project
//! - `TT_STEP_TIMEOUT_SECS` - per-step limit for external commands (default: none)
//! - `TT_PROJECT_SOUND` - set to `0` or `false` to silence the completion cues
//!
//! Command-line flags take precedence over all of these.

use std::path::PathBuf;
use std::time::Duration;

pub const PROJECTS_DIR_ENV: &str = "TINYTAPEOUT_PROJECTS_DIR";
pub const TOOLS_URL_ENV: &str = "TT_SUPPORT_TOOLS_URL";
pub const STEP_TIMEOUT_ENV: &str = "TT_STEP_TIMEOUT_SECS";
pub const SOUND_ENV: &str = "TT_PROJECT_SOUND";

/// Default destination root, relative to the working directory.
pub const DEFAULT_PROJECTS_DIR: &str = "projects";

/// Default support tooling repository.
pub const DEFAULT_TOOLS_URL: &str = "https://github.com/TinyTapeout/tt-support-tools.git";

#[derive(Debug, Clone)]
pub struct Config {
    pub projects_dir: PathBuf,
    pub tools_url: String,
    pub step_timeout: Option<Duration>,
    pub sound: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects_dir: PathBuf::from(DEFAULT_PROJECTS_DIR),
            tools_url: DEFAULT_TOOLS_URL.to_string(),
            step_timeout: None,
            sound: true,
        }
    }
}

impl Config {
    /// Create configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let step_timeout = non_empty(STEP_TIMEOUT_ENV).and_then(|v| match v.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(_) => {
                tracing::warn!("Ignoring {}={:?}: not a number of seconds", STEP_TIMEOUT_ENV, v);
                None
            }
        });

        let sound = non_empty(SOUND_ENV)
            .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.sound);

        Self {
            projects_dir: non_empty(PROJECTS_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.projects_dir),
            tools_url: non_empty(TOOLS_URL_ENV).unwrap_or(defaults.tools_url),
            step_timeout,
            sound,
        }
    }
}
