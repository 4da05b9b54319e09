//! Job state machine
//!
//! Idle → Submitting → InProgress → {Completed | Failed}; a new submission
//! restarts the machine from any state.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Nothing submitted yet
    Idle,
    /// Registration call in flight
    Submitting,
    /// Registered, polling for progress
    InProgress,
    /// Artifacts received
    Completed,
    /// Submission rejected or generation failed
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }

    /// Check if an automatic transition from this state to `target` is valid.
    ///
    /// A new submission (`* → Submitting`) is always allowed; everything else
    /// only moves forward.
    pub fn can_transition_to(&self, target: JobState) -> bool {
        match (self, target) {
            (_, JobState::Submitting) => true,
            (JobState::Submitting, JobState::InProgress) => true,
            (JobState::Submitting, JobState::Failed) => true,
            (JobState::InProgress, JobState::Completed) => true,
            (JobState::InProgress, JobState::Failed) => true,
            // Log/step refreshes keep the job where it is
            (JobState::InProgress, JobState::InProgress) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::Idle => write!(f, "Idle"),
            JobState::Submitting => write!(f, "Submitting"),
            JobState::InProgress => write!(f, "In progress"),
            JobState::Completed => write!(f, "Completed"),
            JobState::Failed => write!(f, "Failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [JobState; 5] = [
        JobState::Idle,
        JobState::Submitting,
        JobState::InProgress,
        JobState::Completed,
        JobState::Failed,
    ];

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::InProgress.is_terminal());
    }

    #[test]
    fn test_submit_allowed_from_everywhere() {
        for state in ALL {
            assert!(state.can_transition_to(JobState::Submitting), "{state}");
        }
    }

    #[test]
    fn test_terminal_states_only_exit_via_submit() {
        for from in [JobState::Completed, JobState::Failed] {
            for to in ALL {
                assert_eq!(from.can_transition_to(to), to == JobState::Submitting);
            }
        }
    }

    #[test]
    fn test_forward_transitions() {
        assert!(JobState::Submitting.can_transition_to(JobState::InProgress));
        assert!(JobState::Submitting.can_transition_to(JobState::Failed));
        assert!(!JobState::Submitting.can_transition_to(JobState::Completed));
        assert!(JobState::InProgress.can_transition_to(JobState::Completed));
        assert!(!JobState::Idle.can_transition_to(JobState::InProgress));
    }

    #[test]
    fn test_serde_names() {
        assert_eq!(
            serde_json::to_string(&JobState::InProgress).unwrap(),
            "\"in_progress\""
        );
    }
}
