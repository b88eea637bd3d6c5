//! Identifiers for paceline entities.

use serde::{Deserialize, Serialize};

/// Unique name of a task.
///
/// Tasks are keyed by name in the progress log; every progress record
/// refers back to its task through this value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskName(String);

impl TaskName {
    /// Create a task name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for TaskName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for TaskName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for TaskName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_name_serializes_as_plain_string() {
        let name = TaskName::from("reading");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"reading\"");

        let back: TaskName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
        assert_eq!(back.to_string(), "reading");
    }
}
