//! `commit_id.json` needs a `sort_id` for the shuttle tooling to order projects.

use std::path::Path;

use chrono::Utc;
use serde_json::Value;

pub const SORT_ID: &str = "sort_id";

#[derive(Debug, thiserror::Error)]
pub enum CommitIdError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object")]
    NotAnObject,
}

/// The `sort_id` of an existing `commit_id.json`, if it has one.
pub fn read_sort_id(path: &Path) -> Option<Value> {
    let text = std::fs::read_to_string(path).ok()?;
    let doc: Value = serde_json::from_str(&text).ok()?;
    doc.get(SORT_ID).cloned()
}

/// Add a `sort_id` to the file at `path` if it lacks one.
///
/// Uses `previous` when given so re-copying keeps a stable value, otherwise
/// the current time in epoch milliseconds. Returns whether the file changed.
pub fn ensure_sort_id(path: &Path, previous: Option<Value>) -> Result<bool, CommitIdError> {
    let text = std::fs::read_to_string(path)?;
    let mut doc: Value = serde_json::from_str(&text)?;
    let obj = doc.as_object_mut().ok_or(CommitIdError::NotAnObject)?;

    if obj.contains_key(SORT_ID) {
        tracing::debug!("sort_id already present in {}", path.display());
        return Ok(false);
    }

    let sort_id = previous.unwrap_or_else(|| Value::from(Utc::now().timestamp_millis()));
    tracing::debug!("Added missing sort_id ({}) to {}", sort_id, path.display());
    obj.insert(SORT_ID.to_string(), sort_id);

    std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adds_missing_sort_id() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("commit_id.json");
        std::fs::write(&path, r#"{"app": "tt-support-tools", "commit": "abc123"}"#).unwrap();

        assert!(ensure_sort_id(&path, None).unwrap());
        let sort_id = read_sort_id(&path).unwrap();
        assert!(sort_id.as_i64().unwrap() > 0);

        assert!(!ensure_sort_id(&path, None).unwrap());
        assert_eq!(read_sort_id(&path), Some(sort_id));
    }

    #[test]
    fn test_reuses_previous_sort_id() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("commit_id.json");
        std::fs::write(&path, r#"{"commit": "abc123"}"#).unwrap();

        ensure_sort_id(&path, Some(Value::from(1700000000000i64))).unwrap();
        assert_eq!(read_sort_id(&path), Some(Value::from(1700000000000i64)));
    }

    #[test]
    fn test_keeps_existing_sort_id() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("commit_id.json");
        std::fs::write(&path, r#"{"commit": "abc123", "sort_id": 5}"#).unwrap();

        assert!(!ensure_sort_id(&path, Some(Value::from(9))).unwrap());
        assert_eq!(read_sort_id(&path), Some(Value::from(5)));
    }

    #[test]
    fn test_rejects_non_object() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("commit_id.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(
            ensure_sort_id(&path, None),
            Err(CommitIdError::NotAnObject)
        ));
    }
}
