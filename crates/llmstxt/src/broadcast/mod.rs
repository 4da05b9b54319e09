//! Broadcasting for real-time job updates.
//!
//! Any presentation layer (terminal, desktop, web bridge) subscribes here to
//! re-render on every state change.

pub mod job_events;

pub use job_events::{JobEvent, JobEventBroadcaster};
