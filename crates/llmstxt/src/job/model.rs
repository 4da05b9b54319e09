use serde::{Deserialize, Serialize};

use crate::api::{RemoteStatus, StatusResponse};
use crate::export::Artifact;
use crate::job::state::JobState;

/// Step label shown between submission and the first poll.
pub const INITIALIZING_STEP: &str = "Initializing...";
/// Step label to display when the service has not named a step.
pub const DEFAULT_STEP_LABEL: &str = "Thinking...";
pub const SUBMISSION_FAILED_MESSAGE: &str = "Failed to start generation";
pub const GENERATION_FAILED_MESSAGE: &str = "Generation failed";

/// The two generated artifacts plus the target they were generated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub target: String,
    /// Contents of `llms.txt`.
    pub summary: String,
    /// Contents of `llms-full.txt`.
    pub full: String,
}

impl JobResult {
    pub fn artifact(&self, artifact: Artifact) -> &str {
        match artifact {
            Artifact::Summary => &self.summary,
            Artifact::Full => &self.full,
        }
    }

    /// Character count of the selected artifact.
    pub fn char_count(&self, artifact: Artifact) -> usize {
        self.artifact(artifact).chars().count()
    }
}

/// State plus the data that only exists in that state.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Idle,
    Submitting,
    InProgress,
    Completed(JobResult),
    Failed(String),
}

/// One generation attempt.
///
/// The result and error message live inside the phase, so a job can never
/// hold both, nor either one outside its terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    target: String,
    phase: Phase,
    logs: Vec<String>,
    current_step: Option<String>,
}

impl Phase {
    fn state(&self) -> JobState {
        match self {
            Phase::Idle => JobState::Idle,
            Phase::Submitting => JobState::Submitting,
            Phase::InProgress => JobState::InProgress,
            Phase::Completed(_) => JobState::Completed,
            Phase::Failed(_) => JobState::Failed,
        }
    }
}

impl Job {
    /// The empty job a controller starts with.
    pub fn idle() -> Self {
        Self {
            target: String::new(),
            phase: Phase::Idle,
            logs: Vec::new(),
            current_step: None,
        }
    }

    /// A freshly submitted job for `target`.
    pub fn submitting(target: &str) -> Self {
        Self {
            target: target.to_string(),
            phase: Phase::Submitting,
            logs: Vec::new(),
            current_step: Some(INITIALIZING_STEP.to_string()),
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> JobState {
        self.phase.state()
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn current_step(&self) -> Option<&str> {
        self.current_step.as_deref()
    }

    pub fn result(&self) -> Option<&JobResult> {
        match &self.phase {
            Phase::Completed(result) => Some(result),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn transition(&mut self, phase: Phase) -> bool {
        let from = self.state();
        let to = phase.state();

        if !from.can_transition_to(to) {
            log::warn!(
                "Ignoring invalid job transition {} -> {} for {}",
                from,
                to,
                self.target
            );
            return false;
        }

        self.phase = phase;
        true
    }

    /// Registration accepted; polling may begin.
    pub fn mark_in_progress(&mut self) -> bool {
        self.transition(Phase::InProgress)
    }

    /// Moves to `Failed` with `message`, or the generic fallback if empty.
    pub fn fail(&mut self, message: &str) -> bool {
        let message = if message.trim().is_empty() {
            GENERATION_FAILED_MESSAGE
        } else {
            message
        };
        self.transition(Phase::Failed(message.to_string()))
    }

    /// Folds one status snapshot from the service into the job.
    ///
    /// Logs are replaced wholesale whenever present; the step label only when
    /// non-empty. Returns the state after the update.
    pub fn apply_status(&mut self, response: &StatusResponse) -> JobState {
        if self.state() != JobState::InProgress {
            return self.state();
        }

        if let Some(logs) = &response.logs {
            self.logs = logs.clone();
        }
        if let Some(step) = response.current_step.as_deref().filter(|s| !s.is_empty()) {
            self.current_step = Some(step.to_string());
        }

        match response.remote_status() {
            RemoteStatus::Completed => {
                if response.llms_txt.is_none() || response.llms_full_txt.is_none() {
                    log::warn!(
                        "Completed job for {} is missing an artifact, using empty text",
                        self.target
                    );
                }
                let result = JobResult {
                    target: self.target.clone(),
                    summary: response.llms_txt.clone().unwrap_or_default(),
                    full: response.llms_full_txt.clone().unwrap_or_default(),
                };
                self.transition(Phase::Completed(result));
            }
            RemoteStatus::Failed => {
                self.fail(response.error.as_deref().unwrap_or_default());
            }
            RemoteStatus::Pending(_) => {}
        }

        self.state()
    }

    pub fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            state: self.state(),
            target: (!matches!(self.phase, Phase::Idle)).then(|| self.target.clone()),
            logs: self.logs.clone(),
            current_step: self.current_step.clone(),
            result: self.result().cloned(),
            error_message: self.error_message().map(|m| m.to_string()),
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::idle()
    }
}

/// Read-only view of a job handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub state: JobState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobSnapshot {
    /// Step text for display, falling back to [`DEFAULT_STEP_LABEL`].
    pub fn step_label(&self) -> &str {
        self.current_step
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_STEP_LABEL)
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}
