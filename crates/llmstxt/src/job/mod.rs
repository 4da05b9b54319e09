pub mod model;
pub mod state;

pub use model::{
    Job, JobResult, JobSnapshot, DEFAULT_STEP_LABEL, GENERATION_FAILED_MESSAGE,
    INITIALIZING_STEP, SUBMISSION_FAILED_MESSAGE,
};
pub use state::JobState;
