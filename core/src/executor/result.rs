use crate::error::TaskError;

/// Outcome of one task descriptor: success, failure, or cancellation.
///
/// Exactly one report is produced per task that started or was abandoned
/// mid-flight; reports are appended to the executor's results in completion
/// order and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct TaskReport<T> {
    pub label: String,
    pub group: String,
    pub success: bool,
    /// Present iff `success`.
    pub data: Option<T>,
    /// Present iff not `success`.
    pub error: Option<TaskError>,
    /// Retry attempts actually consumed.
    pub retries: u32,
    pub duration_ms: u64,
}

impl<T> TaskReport<T> {
    pub(crate) fn succeeded(
        label: &str,
        group: &str,
        data: T,
        retries: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            label: label.to_string(),
            group: group.to_string(),
            success: true,
            data: Some(data),
            error: None,
            retries,
            duration_ms,
        }
    }

    pub(crate) fn failed(
        label: &str,
        group: &str,
        error: TaskError,
        retries: u32,
        duration_ms: u64,
    ) -> Self {
        Self {
            label: label.to_string(),
            group: group.to_string(),
            success: false,
            data: None,
            error: Some(error),
            retries,
            duration_ms,
        }
    }

    /// True when the task settled as cancelled rather than failing on its
    /// own.
    pub fn cancelled(&self) -> bool {
        self.error.as_ref().is_some_and(TaskError::is_cancellation)
    }
}
