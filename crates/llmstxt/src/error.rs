use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmsTxtError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Api(#[from] ApiError),

    #[error("Controller error: {0}")]
    Controller(#[from] ControllerError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Errors from a single call to the generation service.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with a non-2xx status code.
    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },

    /// A 2xx response whose body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Invalid API base URL '{0}'")]
    InvalidBaseUrl(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ControllerError {
    #[error("Target must not be empty")]
    EmptyTarget,

    #[error("No tokio runtime available to run the job")]
    NoRuntime,

    #[error("Invalid poll settings: {0}")]
    InvalidSettings(String),

    #[error("Event channel closed before the job finished")]
    ChannelClosed,
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Job has no result to export")]
    NoResult,

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, LlmsTxtError>;
