use std::fmt;

/// One stage of a pipeline run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Step {
    Fetch,
    CloneTools,
    Configure,
    Harden,
    Submission,
    Copy,
    Manifest,
}

impl Step {
    pub const ALL: [Step; 7] = [
        Self::Fetch,
        Self::CloneTools,
        Self::Configure,
        Self::Harden,
        Self::Submission,
        Self::Copy,
        Self::Manifest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::CloneTools => "clone-tools",
            Self::Configure => "configure",
            Self::Harden => "harden",
            Self::Submission => "submission",
            Self::Copy => "copy",
            Self::Manifest => "manifest",
        }
    }

    /// 1-based position in [`Step::ALL`].
    pub fn number(&self) -> usize {
        Self::ALL
            .iter()
            .position(|s| s == self)
            .map_or(0, |i| i + 1)
    }

    pub fn summary(&self) -> &'static str {
        match self {
            Self::Fetch => "Clone project and rename based on project type (wokwi or verilog)",
            Self::CloneTools => "Clone tt-support-tools repository",
            Self::Configure => "Create user configuration",
            Self::Harden => "Harden the project",
            Self::Submission => "Create TT submission",
            Self::Copy => "Copy hardened project files",
            Self::Manifest => "Update project manifest",
        }
    }

    /// Longer explanation printed by `--help-steps`.
    pub fn details(&self) -> &'static str {
        match self {
            Self::Fetch => {
                "Clones the repository into the working directory, reads info.yaml and renames \
                 the clone to tt_um_wokwi_<wokwi_id> (Wokwi) or <top_module> (Verilog). \
                 A clone with unusable metadata is deleted."
            }
            Self::CloneTools => {
                "Clones the Tiny Tapeout support tools into tt/ inside the project directory."
            }
            Self::Configure => "Generates the user configuration consumed by the hardening flow.",
            Self::Harden => {
                "Runs the hardening flow that turns the design into a manufacturable layout. \
                 This is by far the longest step."
            }
            Self::Submission => {
                "Packages the hardened layout, statistics and commit id into tt_submission/."
            }
            Self::Copy => {
                "Copies docs, LICENSE, info.yaml, stats, commit_id.json and the GDS/LEF/OAS/Verilog \
                 artifacts into the projects directory. Any missing or failed item fails this step."
            }
            Self::Manifest => {
                "Appends a row to project_manifest.csv in the working directory. A failure here \
                 is reported but does not fail the run."
            }
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A step together with the external command it runs, if any.
#[derive(Debug, Clone)]
pub struct StepDescription {
    pub step: Step,
    pub command: Option<String>,
}
