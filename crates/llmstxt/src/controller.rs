//! Lifecycle manager for generation jobs.
//!
//! A [`JobController`] owns exactly one [`Job`]. Each `submit` bumps a
//! generation token, cancels the task of the previous job, and spawns a new
//! task that registers the job with the service and then polls it until a
//! terminal status arrives. Every mutation a task makes is checked against the
//! current token under the controller lock, so results from an abandoned job
//! can never reach the job or its subscribers.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::api::{BackendClient, GenerationBackend};
use crate::broadcast::{JobEvent, JobEventBroadcaster};
use crate::config::{validate_config, ClientConfig};
use crate::error::{ControllerError, Result as LlmsTxtResult};
use crate::job::{Job, JobSnapshot, JobState, SUBMISSION_FAILED_MESSAGE};

pub const LOST_CONTACT_MESSAGE: &str = "Lost contact with the generation service";
pub const TIMED_OUT_MESSAGE: &str = "Generation timed out";

/// Timing and give-up rules for the polling loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    /// `None` retries failed ticks forever.
    pub max_consecutive_failures: Option<u32>,
    /// `None` waits forever for a terminal status.
    pub job_timeout: Option<Duration>,
}

impl From<&ClientConfig> for PollSettings {
    fn from(config: &ClientConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            max_consecutive_failures: config.max_consecutive_poll_failures,
            job_timeout: config.job_timeout(),
        }
    }
}

impl PollSettings {
    /// Rejects settings the polling loop cannot run with.
    pub fn validate(&self) -> Result<(), ControllerError> {
        if self.interval.is_zero() {
            return Err(ControllerError::InvalidSettings(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&ClientConfig::default())
    }
}

/// Task handle of the job currently being tracked.
struct LiveJob {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl LiveJob {
    fn stop(self) {
        self.cancel.cancel();
        self.handle.abort();
    }
}

struct ControllerState {
    generation: u64,
    job: Job,
    live: Option<LiveJob>,
}

struct Shared {
    state: Mutex<ControllerState>,
    broadcaster: JobEventBroadcaster,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("Controller state lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}

/// Submits generation jobs and tracks the latest one to completion.
pub struct JobController {
    backend: Arc<dyn GenerationBackend>,
    settings: PollSettings,
    shared: Arc<Shared>,
}

impl JobController {
    /// Creates a controller talking to `backend`.
    pub fn new(
        backend: Arc<dyn GenerationBackend>,
        settings: PollSettings,
    ) -> Result<Self, ControllerError> {
        Self::with_broadcaster(backend, settings, JobEventBroadcaster::default())
    }

    /// Creates a controller that publishes through an existing broadcaster.
    pub fn with_broadcaster(
        backend: Arc<dyn GenerationBackend>,
        settings: PollSettings,
        broadcaster: JobEventBroadcaster,
    ) -> Result<Self, ControllerError> {
        settings.validate()?;
        Ok(Self {
            backend,
            settings,
            shared: Arc::new(Shared {
                state: Mutex::new(ControllerState {
                    generation: 0,
                    job: Job::idle(),
                    live: None,
                }),
                broadcaster,
            }),
        })
    }

    /// Creates a controller backed by an HTTP [`BackendClient`].
    pub fn from_config(config: &ClientConfig) -> LlmsTxtResult<Self> {
        validate_config(config)?;
        let client = BackendClient::new(config)?;
        let controller = Self::with_broadcaster(
            Arc::new(client),
            PollSettings::from(config),
            JobEventBroadcaster::new(config.channel_capacity),
        )?;
        Ok(controller)
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Starts a new job for `target`, abandoning any job still running.
    ///
    /// Subscribers see the `Submitting` snapshot before this returns; every
    /// later transition arrives asynchronously. Returns the generation token
    /// of the new job. Must be called from within a tokio runtime.
    pub fn submit(&self, target: &str) -> Result<u64, ControllerError> {
        if target.trim().is_empty() {
            return Err(ControllerError::EmptyTarget);
        }
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;

        let mut state = self.shared.lock();

        if let Some(previous) = state.live.take() {
            info!(
                generation = state.generation,
                url = state.job.target(),
                "Abandoning live job for new submission"
            );
            previous.stop();
        }

        state.generation += 1;
        let generation = state.generation;
        state.job = Job::submitting(target);
        self.shared
            .broadcaster
            .send(JobEvent::new(generation, state.job.snapshot()));

        let cancel = CancellationToken::new();
        let runner = JobRunner {
            generation,
            target: target.to_string(),
            backend: Arc::clone(&self.backend),
            settings: self.settings.clone(),
            shared: Arc::clone(&self.shared),
            cancel: cancel.clone(),
        };
        let span = info_span!("job", generation, url = %target);
        let handle = runtime.spawn(runner.run().instrument(span));
        state.live = Some(LiveJob { cancel, handle });

        Ok(generation)
    }

    /// Current view of the job.
    pub fn snapshot(&self) -> JobSnapshot {
        self.shared.lock().job.snapshot()
    }

    pub fn state(&self) -> JobState {
        self.shared.lock().job.state()
    }

    /// Generation token of the current job; 0 before the first submission.
    pub fn generation(&self) -> u64 {
        self.shared.lock().generation
    }

    /// True while a job task is registering or polling.
    pub fn is_polling(&self) -> bool {
        self.shared.lock().live.is_some()
    }

    /// Subscribes to job events. Only events sent after this call are seen.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.shared.broadcaster.subscribe()
    }

    /// Stops the live job's task without changing the visible job state.
    pub fn shutdown(&self) {
        let mut state = self.shared.lock();
        if let Some(live) = state.live.take() {
            debug!(generation = state.generation, "Stopping live job");
            live.stop();
        }
    }

    /// Waits until the current job is terminal or no longer being tracked.
    pub async fn wait_for_terminal(&self) -> Result<JobSnapshot, ControllerError> {
        let mut rx = self.subscribe();
        loop {
            let (snapshot, polling) = {
                let state = self.shared.lock();
                (state.job.snapshot(), state.live.is_some())
            };
            if snapshot.is_terminal() || !polling {
                return Ok(snapshot);
            }

            match rx.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(ControllerError::ChannelClosed)
                }
            }
        }
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Drives one job from registration to a terminal state.
struct JobRunner {
    generation: u64,
    target: String,
    backend: Arc<dyn GenerationBackend>,
    settings: PollSettings,
    shared: Arc<Shared>,
    cancel: CancellationToken,
}

impl JobRunner {
    async fn run(self) {
        let submitted = tokio::select! {
            _ = self.cancel.cancelled() => return,
            result = self.backend.submit(&self.target) => result,
        };

        match submitted {
            Ok(()) => {
                info!("Generation job registered");
                match self.update(|job| {
                    job.mark_in_progress();
                }) {
                    Some(JobState::InProgress) => self.poll_until_terminal().await,
                    _ => debug!("Job superseded before polling started"),
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to register generation job");
                self.update(|job| {
                    job.fail(SUBMISSION_FAILED_MESSAGE);
                });
            }
        }
    }

    async fn poll_until_terminal(&self) {
        let deadline = self.settings.job_timeout.map(|limit| Instant::now() + limit);
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // skip immediate first tick

        let mut consecutive_failures: u32 = 0;

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Polling cancelled");
                    return;
                }
                _ = expired(deadline) => {
                    self.time_out();
                    return;
                }
                _ = ticker.tick() => {}
            }

            let polled = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Polling cancelled with a request in flight");
                    return;
                }
                _ = expired(deadline) => {
                    self.time_out();
                    return;
                }
                result = self.backend.fetch_status(&self.target) => result,
            };

            match polled {
                Ok(response) => {
                    consecutive_failures = 0;
                    match self.update(|job| {
                        job.apply_status(&response);
                    }) {
                        None => return,
                        Some(state) if state.is_terminal() => {
                            info!(state = %state, "Job finished");
                            return;
                        }
                        Some(_) => {}
                    }
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!(
                        error = %e,
                        consecutive_failures,
                        "Status poll failed, retrying on next tick"
                    );

                    if let Some(max) = self.settings.max_consecutive_failures {
                        if consecutive_failures >= max {
                            self.update(|job| {
                                job.fail(LOST_CONTACT_MESSAGE);
                            });
                            return;
                        }
                    }
                }
            }
        }
    }

    fn time_out(&self) {
        warn!(
            timeout_secs = self.settings.job_timeout.map(|l| l.as_secs()),
            "Job exceeded its time limit"
        );
        self.update(|job| {
            job.fail(TIMED_OUT_MESSAGE);
        });
    }

    /// Applies `f` to the job if this runner still owns it, notifying
    /// subscribers when anything changed. Returns `None` for a stale runner.
    fn update<F: FnOnce(&mut Job)>(&self, f: F) -> Option<JobState> {
        let mut state = self.shared.lock();
        if state.generation != self.generation || self.cancel.is_cancelled() {
            debug!(
                current_generation = state.generation,
                "Discarding result for abandoned job"
            );
            return None;
        }

        let before = state.job.clone();
        f(&mut state.job);
        let after = state.job.state();

        if state.job != before {
            self.shared
                .broadcaster
                .send(JobEvent::new(self.generation, state.job.snapshot()));
        }

        if after.is_terminal() {
            // Detach: this task is the live one and is about to return.
            state.live = None;
        }

        Some(after)
    }
}

/// Resolves once `deadline` has passed; never without one.
async fn expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StatusResponse;
    use crate::error::{ApiError, LlmsTxtError};
    use async_trait::async_trait;

    struct NeverCalled;

    #[async_trait]
    impl GenerationBackend for NeverCalled {
        async fn submit(&self, _target: &str) -> Result<(), ApiError> {
            unreachable!("submit should not be reached")
        }

        async fn fetch_status(&self, _target: &str) -> Result<StatusResponse, ApiError> {
            unreachable!("fetch_status should not be reached")
        }
    }

    fn controller() -> JobController {
        JobController::new(Arc::new(NeverCalled), PollSettings::default()).unwrap()
    }

    #[test]
    fn test_starts_idle() {
        let controller = controller();
        assert_eq!(controller.state(), JobState::Idle);
        assert_eq!(controller.generation(), 0);
        assert!(!controller.is_polling());
        assert!(controller.snapshot().target.is_none());
    }

    #[test]
    fn test_rejects_empty_target() {
        let controller = controller();
        assert!(matches!(
            controller.submit("   "),
            Err(ControllerError::EmptyTarget)
        ));
        assert_eq!(controller.generation(), 0);
    }

    #[test]
    fn test_submit_requires_runtime() {
        let controller = controller();
        assert!(matches!(
            controller.submit("https://docs.example.com"),
            Err(ControllerError::NoRuntime)
        ));
        assert_eq!(controller.state(), JobState::Idle);
    }

    #[test]
    fn test_settings_from_config() {
        let config = ClientConfig {
            poll_interval_ms: 250,
            max_consecutive_poll_failures: Some(4),
            job_timeout_secs: Some(30),
            ..ClientConfig::default()
        };
        let settings = PollSettings::from(&config);
        assert_eq!(settings.interval, Duration::from_millis(250));
        assert_eq!(settings.max_consecutive_failures, Some(4));
        assert_eq!(settings.job_timeout, Some(Duration::from_secs(30)));
        assert_eq!(PollSettings::default().interval, Duration::from_secs(1));
    }

    #[test]
    fn test_rejects_zero_interval() {
        let settings = PollSettings {
            interval: Duration::ZERO,
            ..PollSettings::default()
        };
        assert!(matches!(
            JobController::new(Arc::new(NeverCalled), settings),
            Err(ControllerError::InvalidSettings(_))
        ));
    }

    #[test]
    fn test_from_config_validates() {
        let config = ClientConfig {
            poll_interval_ms: 0,
            ..ClientConfig::default()
        };
        assert!(matches!(
            JobController::from_config(&config),
            Err(LlmsTxtError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_wait_for_terminal_when_idle() {
        let controller = controller();
        let snapshot = controller.wait_for_terminal().await.unwrap();
        assert_eq!(snapshot.state, JobState::Idle);
    }
}
