//! Shared helpers for controller integration tests.
//!
//! `ScriptedBackend` answers from per-target queues of canned responses and
//! records every call, so tests can assert exactly which requests fired.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::broadcast;

use llmstxt::api::{GenerationBackend, StatusResponse};
use llmstxt::{ApiError, JobController, JobEvent, JobState, PollSettings};

/// One canned answer to `GET /result`.
#[derive(Clone)]
pub enum Poll {
    Respond(StatusResponse),
    /// Answer with this HTTP status instead of a body.
    Error(u16),
    /// Respond only after the delay has elapsed.
    Delayed(Duration, StatusResponse),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Submit(String),
    Poll(String),
}

#[derive(Default)]
struct Script {
    submit_status: HashMap<String, u16>,
    submit_delay: HashMap<String, Duration>,
    polls: HashMap<String, VecDeque<Poll>>,
    calls: Vec<Call>,
}

#[derive(Clone, Default)]
pub struct ScriptedBackend {
    script: Arc<Mutex<Script>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `POST /generate` for `target` answer with `status`.
    pub fn reject_submit(&self, target: &str, status: u16) {
        let mut script = self.script.lock().unwrap();
        script.submit_status.insert(target.to_string(), status);
    }

    /// Makes `POST /generate` for `target` answer only after `delay`.
    pub fn delay_submit(&self, target: &str, delay: Duration) {
        let mut script = self.script.lock().unwrap();
        script.submit_delay.insert(target.to_string(), delay);
    }

    /// Queues poll answers for `target`. Once the queue is empty every poll
    /// answers `{"status": "running"}`.
    pub fn script_polls(&self, target: &str, polls: Vec<Poll>) {
        let mut script = self.script.lock().unwrap();
        script
            .polls
            .entry(target.to_string())
            .or_default()
            .extend(polls);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.script.lock().unwrap().calls.clone()
    }

    pub fn poll_count(&self, target: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Poll(t) if t == target))
            .count()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn submit(&self, target: &str) -> Result<(), ApiError> {
        let (status, delay) = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Submit(target.to_string()));
            (
                script.submit_status.get(target).copied(),
                script.submit_delay.get(target).copied(),
            )
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match status {
            Some(status) => Err(ApiError::Status {
                status,
                body: "Internal Server Error".to_string(),
            }),
            None => Ok(()),
        }
    }

    async fn fetch_status(&self, target: &str) -> Result<StatusResponse, ApiError> {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(Call::Poll(target.to_string()));
            script.polls.get_mut(target).and_then(|q| q.pop_front())
        };

        match next {
            Some(Poll::Respond(response)) => Ok(response),
            Some(Poll::Error(status)) => Err(ApiError::Status {
                status,
                body: "unavailable".to_string(),
            }),
            Some(Poll::Delayed(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            None => Ok(StatusResponse {
                status: "running".to_string(),
                ..StatusResponse::default()
            }),
        }
    }
}

/// A still-running response carrying a step label and log snapshot.
pub fn running(step: &str, logs: &[&str]) -> StatusResponse {
    StatusResponse {
        status: "running".to_string(),
        current_step: Some(step.to_string()),
        logs: Some(logs.iter().map(|l| l.to_string()).collect()),
        ..StatusResponse::default()
    }
}

pub fn completed(llms_txt: &str, llms_full_txt: &str) -> StatusResponse {
    StatusResponse {
        status: "completed".to_string(),
        llms_txt: Some(llms_txt.to_string()),
        llms_full_txt: Some(llms_full_txt.to_string()),
        ..StatusResponse::default()
    }
}

pub fn failed(error: Option<&str>) -> StatusResponse {
    StatusResponse {
        status: "failed".to_string(),
        error: error.map(|e| e.to_string()),
        ..StatusResponse::default()
    }
}

pub const INTERVAL: Duration = Duration::from_millis(1000);

pub fn settings() -> PollSettings {
    PollSettings {
        interval: INTERVAL,
        max_consecutive_failures: None,
        job_timeout: None,
    }
}

pub fn controller(backend: &ScriptedBackend, settings: PollSettings) -> JobController {
    JobController::new(Arc::new(backend.clone()), settings).unwrap()
}

/// Receives the next event, failing the test if none arrives in a minute of
/// (usually paused) time.
pub async fn next_event(rx: &mut broadcast::Receiver<JobEvent>) -> JobEvent {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for job event")
        .expect("event channel closed")
}

/// Collects events until one with a terminal state arrives.
pub async fn events_until_terminal(rx: &mut broadcast::Receiver<JobEvent>) -> Vec<JobEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(rx).await;
        let done = event.snapshot.state.is_terminal();
        events.push(event);
        if done {
            return events;
        }
    }
}

pub fn states(events: &[JobEvent]) -> Vec<JobState> {
    events.iter().map(|e| e.snapshot.state).collect()
}
