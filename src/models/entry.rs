use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer, Serialize};

/// One row of the processed-projects manifest.
///
/// The manifest is append-only: rows are written once when a pipeline run
/// finishes and are never rewritten. Processing the same repository twice
/// produces two rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub project_name: String,
    pub github_url: String,
    /// Directory name of the project relative to where the pipeline ran.
    pub project_directory: String,
    /// Written as RFC 3339. Rows without an offset are read as local time.
    #[serde(deserialize_with = "deserialize_processed_date")]
    pub processed_date: DateTime<Local>,
    pub status: EntryStatus,
}

impl ManifestEntry {
    /// A completed entry stamped with the current local time.
    pub fn completed(
        project_name: impl Into<String>,
        github_url: impl Into<String>,
        project_directory: impl Into<String>,
    ) -> Self {
        Self {
            project_name: project_name.into(),
            github_url: github_url.into(),
            project_directory: project_directory.into(),
            processed_date: Local::now(),
            status: EntryStatus::Completed,
        }
    }
}

/// Outcome recorded for a manifest row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Completed,
    Failed,
}

impl EntryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

fn deserialize_processed_date<'de, D>(deserializer: D) -> Result<DateTime<Local>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_processed_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid processed_date '{}'", raw)))
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.ffffff]` taken as local time.
pub fn parse_processed_date(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Timelike};

    #[test]
    fn test_parses_rfc3339() {
        let dt = parse_processed_date("2025-03-14T15:09:26+00:00").unwrap();
        assert_eq!(dt.timestamp(), 1741964966);
    }

    #[test]
    fn test_parses_naive_timestamp_as_local() {
        let dt = parse_processed_date("2024-05-01T12:34:56.123456").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_micro_opt(12, 34, 56, 123456)
            .unwrap();
        assert_eq!(dt.naive_local(), expected);

        let dt = parse_processed_date("2024-05-01 08:00:00").unwrap();
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(parse_processed_date("yesterday").is_none());
        assert!(parse_processed_date("").is_none());
    }
}
