//! JSON output formatting

use serde::{Deserialize, Serialize};

use branch_cleaner_core::{BranchReport, CleanerError};

const SCHEMA_VERSION: &str = "1";

/// JSON response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse<T> {
    /// Schema version for forward compatibility
    pub schema_version: String,
    /// Command that generated this response
    pub command: String,
    /// Status: "ok" or "error"
    pub status: String,
    /// Command-specific payload
    pub data: T,
    /// Errors and warnings
    pub issues: Vec<JsonIssue>,
}

impl<T> JsonResponse<T> {
    /// Create a successful response
    pub fn ok(command: &str, data: T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            status: "ok".to_string(),
            data,
            issues: vec![],
        }
    }

    /// Create an error response
    pub fn error(command: &str, data: T, issues: Vec<JsonIssue>) -> Self {
        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            command: command.to_string(),
            status: "error".to_string(),
            data,
            issues,
        }
    }
}

/// Issue object structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonIssue {
    /// Error code (e.g., "E001")
    pub code: String,
    /// Severity level
    pub severity: String,
    /// Human-readable message
    pub message: String,
}

impl From<&CleanerError> for JsonIssue {
    fn from(err: &CleanerError) -> Self {
        Self {
            code: err.code().to_string(),
            severity: "error".to_string(),
            message: err.to_string(),
        }
    }
}

/// Data payload for the clean command
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CleanData {
    /// Reference branch candidates were compared against
    pub reference_branch: String,
    /// Reference head commit captured before scanning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_head: Option<String>,
    /// Every analyzed branch with its verdict
    pub branches: Vec<BranchReport>,
    /// Branches up-to-date with the reference, in scan order
    pub redundant: Vec<String>,
    /// Branches actually deleted, in deletion order
    pub deleted: Vec<String>,
    /// True when deletion was not attempted
    pub dry_run: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use branch_cleaner_core::{CommitHash, Verdict};

    #[test]
    fn test_ok_envelope() {
        let data = CleanData {
            reference_branch: "origin/master".to_string(),
            redundant: vec!["feature-a".to_string()],
            ..Default::default()
        };
        let json = serde_json::to_value(JsonResponse::ok("clean", data)).unwrap();
        assert_eq!(json["schema_version"], "1");
        assert_eq!(json["status"], "ok");
        assert_eq!(json["data"]["redundant"][0], "feature-a");
        assert!(json["data"].get("reference_head").is_none());
    }

    #[test]
    fn test_error_issue_from_cleaner_error() {
        let err = CleanerError::ReferenceBranchLocalOnly {
            branch: "master".to_string(),
        };
        let response =
            JsonResponse::error("clean", CleanData::default(), vec![JsonIssue::from(&err)]);
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["issues"][0]["code"], "E002");
        assert_eq!(json["issues"][0]["severity"], "error");
    }

    #[test]
    fn test_branch_verdicts_serialize_flat() {
        let head = CommitHash::parse(&"ab".repeat(20)).unwrap();
        let data = CleanData {
            branches: vec![
                BranchReport {
                    branch: "a".to_string(),
                    verdict: Verdict::Redundant,
                },
                BranchReport {
                    branch: "c".to_string(),
                    verdict: Verdict::Diverged { head },
                },
            ],
            ..Default::default()
        };
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["branches"][0]["branch"], "a");
        assert_eq!(json["branches"][0]["verdict"], "redundant");
        assert_eq!(json["branches"][1]["verdict"], "diverged");
        assert_eq!(json["branches"][1]["head"], "ab".repeat(20));
    }
}
