//! Access to the generation service.
//!
//! [`GenerationBackend`] is the seam the job controller talks through;
//! [`BackendClient`] is the HTTP implementation.

pub mod client;
pub mod types;

use async_trait::async_trait;

use crate::error::ApiError;

pub use client::BackendClient;
pub use types::{GenerateRequest, RemoteStatus, StatusResponse};

/// Operations the job controller needs from the generation service.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Registers a generation job for `target`. Any 2xx answer is success.
    async fn submit(&self, target: &str) -> Result<(), ApiError>;

    /// Fetches the current status snapshot of the job for `target`.
    async fn fetch_status(&self, target: &str) -> Result<StatusResponse, ApiError>;
}
