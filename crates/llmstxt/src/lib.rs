pub mod api;
pub mod broadcast;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod job;
pub mod telemetry;

pub use api::{BackendClient, GenerationBackend, StatusResponse};
pub use broadcast::{JobEvent, JobEventBroadcaster};
pub use config::{load_config, ClientConfig};
pub use controller::{JobController, PollSettings};
pub use error::{ApiError, ConfigError, ControllerError, ExportError, LlmsTxtError, Result};
pub use export::{export_artifact, Artifact, ArtifactSink, FileSink};
pub use job::{Job, JobResult, JobSnapshot, JobState};
pub use telemetry::{init_logging, LogFormat};
