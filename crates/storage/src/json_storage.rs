//! JSON file log source.
//!
//! Reads a single document of the form
//! `{ "tasks": [...], "progress": [...] }`. Documents produced by the log
//! server carry an extra `success` flag and, on failure, an `error` message;
//! both are honoured.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use paceline_core::{ProgressLog, ProgressRecord, Task};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use super::{LogSource, Result, StorageError};

/// On-disk shape of a progress log.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogDocument {
    /// `false` when the producer failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    /// Failure message accompanying `success: false`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Task list
    #[serde(default)]
    pub tasks: Vec<Task>,

    /// Progress records, in any order
    #[serde(default)]
    pub progress: Vec<ProgressRecord>,
}

impl LogDocument {
    /// Create a document from tasks and records.
    pub fn new(tasks: Vec<Task>, progress: Vec<ProgressRecord>) -> Self {
        Self {
            success: None,
            error: None,
            tasks,
            progress,
        }
    }

    /// Validate into a [`ProgressLog`].
    pub fn into_log(self) -> Result<ProgressLog> {
        if self.success == Some(false) {
            return Err(StorageError::Rejected(
                self.error.unwrap_or_else(|| "unspecified error".to_string()),
            ));
        }
        Ok(ProgressLog::new(self.tasks, self.progress)?)
    }
}

/// File-based JSON log source.
pub struct JsonLogStorage {
    path: PathBuf,
}

impl JsonLogStorage {
    /// Create a source reading `path`. The file is not touched until
    /// [`load`](LogSource::load).
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the raw document without validating it.
    pub async fn read_document(&self) -> Result<LogDocument> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(s) => s,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_str(&content)?)
    }

    /// Write a document, replacing the file.
    pub async fn save_document(&self, doc: &LogDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(doc)?).await?;
        Ok(())
    }
}

#[async_trait]
impl LogSource for JsonLogStorage {
    async fn load(&self) -> Result<ProgressLog> {
        let doc = self.read_document().await?;
        debug!(
            path = %self.path.display(),
            tasks = doc.tasks.len(),
            records = doc.progress.len(),
            "read progress log"
        );
        doc.into_log()
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use paceline_core::{LogError, Time};
    use tempfile::TempDir;

    fn t(hours: i64) -> Time {
        Utc.timestamp_opt(0, 0).unwrap() + Duration::hours(hours)
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = JsonLogStorage::new(dir.path().join("nested").join("log.json"));

        let doc = LogDocument::new(
            vec![Task::new("a", 10.0, t(0), t(48))],
            vec![
                ProgressRecord::new("a", t(5), 4.0).with_active(0.1),
                ProgressRecord::new("a", t(1), 1.0),
            ],
        );
        storage.save_document(&doc).await.unwrap();

        let log = storage.load().await.unwrap();
        assert_eq!(log.tasks().len(), 1);
        assert_eq!(log.completed(&"a".into()), 4.0);
        assert_eq!(log.history(&"a".into())[0].time, t(1));
        assert!(storage.describe().starts_with("json:"));
    }

    #[tokio::test]
    async fn test_server_style_document_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        tokio::fs::write(
            &path,
            r#"{
                "success": true,
                "tasks": [{"name": "a", "total": 5, "startTime": 0, "endTime": 3600000}],
                "progress": [{"time": 0, "name": "a", "done": 1}]
            }"#,
        )
        .await
        .unwrap();

        let log = JsonLogStorage::new(&path).load().await.unwrap();
        assert_eq!(log.completed(&"a".into()), 1.0);
    }

    #[tokio::test]
    async fn test_failed_document_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        tokio::fs::write(&path, r#"{"success": false, "error": "sheet locked"}"#)
            .await
            .unwrap();

        let err = JsonLogStorage::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Rejected(ref m) if m == "sheet locked"));
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = JsonLogStorage::new(dir.path().join("nope.json"))
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_unknown_task_surfaces_log_error() {
        let dir = TempDir::new().unwrap();
        let storage = JsonLogStorage::new(dir.path().join("log.json"));
        storage
            .save_document(&LogDocument::new(
                vec![],
                vec![ProgressRecord::new("ghost", t(1), 1.0)],
            ))
            .await
            .unwrap();

        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Log(LogError::UnknownTask { .. })));
    }

    #[tokio::test]
    async fn test_malformed_json_is_a_json_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let err = JsonLogStorage::new(&path).load().await.unwrap_err();
        assert!(matches!(err, StorageError::Json(_)));
    }
}
