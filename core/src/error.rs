use std::time::Duration;

use thiserror::Error;

/// Terminal failure reason carried by a task report.
///
/// Cancellation variants are deliberately distinct from `Failed`/`Timeout`:
/// a cancelled task never triggers `stop_on_error` and is never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task body returned an error.
    #[error("task failed: {0}")]
    Failed(String),

    /// The task body did not settle within its allotted time.
    #[error("task timed out after {0:?}")]
    Timeout(Duration),

    /// The task's group was cancelled before or during the attempt.
    #[error("task cancelled")]
    Cancelled,

    /// The whole executor was stopped before or during the attempt.
    #[error("executor stopped")]
    Stopped,
}

impl TaskError {
    /// True for the two cancellation-flavoured variants.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Stopped)
    }
}

/// Run-level executor errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    /// A task failure ended the run because `stop_on_error` was set.
    #[error("task '{label}' aborted the run: {source}")]
    Aborted {
        label: String,
        #[source]
        source: TaskError,
    },
}
