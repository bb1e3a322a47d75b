use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;

/// Group assigned to tasks submitted without an explicit tag.
pub const DEFAULT_GROUP: &str = "default";

/// Factory producing one attempt future per invocation, so a retried task
/// gets a fresh future instead of polling a spent one.
pub type TaskFn<T> = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<T>> + Send + Sync>;

/// One unit of asynchronous work plus its scheduling metadata.
///
/// The work itself is opaque to the executor; it may do file I/O, network
/// calls, or shell invocation. Descriptors are immutable once built.
#[derive(Clone)]
pub struct TaskDescriptor<T> {
    work: TaskFn<T>,
    label: String,
    group: String,
    timeout: Option<Duration>,
}

impl<T> TaskDescriptor<T> {
    pub fn new<F, Fut>(label: impl Into<String>, work: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
    {
        Self {
            work: Arc::new(move || Box::pin(work())),
            label: label.into(),
            group: DEFAULT_GROUP.to_string(),
            timeout: None,
        }
    }

    /// Tag the task with a concurrency/progress group.
    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = group.into();
        self
    }

    /// Override the executor-wide timeout for this task. A zero duration
    /// disables the timeout entirely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub(crate) fn attempt(&self) -> BoxFuture<'static, anyhow::Result<T>> {
        (self.work)()
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            label: self.label.clone(),
            group: self.group.clone(),
            timeout: self.timeout,
        }
    }
}

impl<T> fmt::Debug for TaskDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("label", &self.label)
            .field("group", &self.group)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Read-only snapshot of a queued or running task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub label: String,
    pub group: String,
    pub timeout: Option<Duration>,
}
