//! Wire types for the generation service.

use serde::{Deserialize, Serialize};

/// Body of `POST /generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateRequest {
    pub url: String,
}

/// Status sentinel reported by `GET /result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Completed,
    Failed,
    /// Any other value (`running`, `processing`, ...) means work continues.
    Pending(String),
}

impl RemoteStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "completed" => RemoteStatus::Completed,
            "failed" => RemoteStatus::Failed,
            other => RemoteStatus::Pending(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, RemoteStatus::Pending(_))
    }
}

/// Body of a 2xx `GET /result` response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    #[serde(default)]
    pub status: String,
    /// Full log snapshot, not a delta.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_txt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llms_full_txt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatusResponse {
    pub fn remote_status(&self) -> RemoteStatus {
        RemoteStatus::parse(&self.status)
    }
}

#[cfg(test)]
impl StatusResponse {
    /// A still-running response carrying a step label and log snapshot.
    pub fn running(step: &str, logs: &[&str]) -> Self {
        Self {
            status: "running".to_string(),
            current_step: Some(step.to_string()),
            logs: Some(logs.iter().map(|l| l.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn completed(llms_txt: &str, llms_full_txt: &str) -> Self {
        Self {
            status: "completed".to_string(),
            llms_txt: Some(llms_txt.to_string()),
            llms_full_txt: Some(llms_full_txt.to_string()),
            ..Self::default()
        }
    }

    pub fn failed(error: Option<&str>) -> Self {
        Self {
            status: "failed".to_string(),
            error: error.map(|e| e.to_string()),
            ..Self::default()
        }
    }
}
