use std::path::PathBuf;

/// Whether an item must exist in a hardened project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    Optional,
}

/// What happened to a single copy item.
///
/// - `Copied`: source existed and was copied
/// - `Failed`: source existed but the copy returned an error
/// - `MissingRequired`: a required source was absent
/// - `SkippedOptional`: an optional source was absent (not an error)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopyOutcome {
    Copied,
    Failed(String),
    MissingRequired,
    SkippedOptional,
}

/// The result of one copy attempt.
#[derive(Debug, Clone)]
pub struct CopyRecord {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub outcome: CopyOutcome,
}

impl CopyRecord {
    /// Whether this record counts toward the attempted total.
    ///
    /// Skipped optional files do not; missing required items do, so that
    /// an absent `stats/` directory shows up as a failed operation.
    pub fn is_attempt(&self) -> bool {
        !matches!(self.outcome, CopyOutcome::SkippedOptional)
    }
}

/// Aggregate result of a best-effort copy pass.
#[derive(Debug, Clone, Default)]
pub struct CopyReport {
    /// Destination project directory.
    pub destination: PathBuf,
    pub records: Vec<CopyRecord>,
}

impl CopyReport {
    pub fn new(destination: PathBuf) -> Self {
        Self {
            destination,
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, source: PathBuf, destination: PathBuf, outcome: CopyOutcome) {
        self.records.push(CopyRecord {
            source,
            destination,
            outcome,
        });
    }

    pub fn attempted(&self) -> usize {
        self.records.iter().filter(|r| r.is_attempt()).count()
    }

    pub fn succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == CopyOutcome::Copied)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    /// Required items that were absent at the source.
    pub fn required_failures(&self) -> impl Iterator<Item = &CopyRecord> {
        self.records
            .iter()
            .filter(|r| r.outcome == CopyOutcome::MissingRequired)
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}
