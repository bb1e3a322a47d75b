use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::TaskError;

use super::result::TaskReport;

pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;
pub type CompleteCallback<T> = Arc<dyn Fn(&TaskReport<T>) + Send + Sync>;
pub type SuccessCallback<T> = Arc<dyn Fn(&T, &TaskReport<T>) + Send + Sync>;
pub type ErrorCallback<T> = Arc<dyn Fn(&TaskError, &TaskReport<T>) + Send + Sync>;

/// Executor configuration.
///
/// The concurrency ceiling for a group is its `group_concurrency` override
/// when present, otherwise `max_concurrency`; `None` means unbounded. The
/// observation callbacks are single-slot seams for the embedding
/// application; they are invoked synchronously as each task concludes and
/// must not block.
#[derive(Clone)]
pub struct ExecutorConfig<T> {
    pub max_concurrency: Option<usize>,
    pub group_concurrency: HashMap<String, usize>,
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Pause between a failed attempt and its retry.
    pub retry_delay: Duration,
    /// Abort the whole run on the first task failure.
    pub stop_on_error: bool,
    /// Default per-task timeout. `None` or zero means no timeout.
    pub timeout: Option<Duration>,
    /// Spawn `run()` onto the runtime at construction.
    pub auto_start: bool,
    pub on_progress: Option<ProgressCallback>,
    pub on_complete: Option<CompleteCallback<T>>,
    pub on_success: Option<SuccessCallback<T>>,
    pub on_error: Option<ErrorCallback<T>>,
}

impl<T> Default for ExecutorConfig<T> {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            group_concurrency: HashMap::new(),
            max_retries: 0,
            retry_delay: Duration::from_millis(100),
            stop_on_error: false,
            timeout: None,
            auto_start: false,
            on_progress: None,
            on_complete: None,
            on_success: None,
            on_error: None,
        }
    }
}

impl<T> ExecutorConfig<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn group_concurrency(mut self, group: impl Into<String>, limit: usize) -> Self {
        self.group_concurrency.insert(group.into(), limit);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn auto_start(mut self, auto: bool) -> Self {
        self.auto_start = auto;
        self
    }

    pub fn on_progress(
        mut self,
        callback: impl Fn(usize, usize, &str) + Send + Sync + 'static,
    ) -> Self {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub fn on_complete(
        mut self,
        callback: impl Fn(&TaskReport<T>) + Send + Sync + 'static,
    ) -> Self {
        self.on_complete = Some(Arc::new(callback));
        self
    }

    pub fn on_success(
        mut self,
        callback: impl Fn(&T, &TaskReport<T>) + Send + Sync + 'static,
    ) -> Self {
        self.on_success = Some(Arc::new(callback));
        self
    }

    pub fn on_error(
        mut self,
        callback: impl Fn(&TaskError, &TaskReport<T>) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Some(Arc::new(callback));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg: ExecutorConfig<()> = ExecutorConfig::default();
        assert_eq!(cfg.max_concurrency, None);
        assert_eq!(cfg.max_retries, 0);
        assert_eq!(cfg.retry_delay, Duration::from_millis(100));
        assert!(!cfg.stop_on_error);
        assert!(cfg.timeout.is_none());
        assert!(!cfg.auto_start);
    }

    #[test]
    fn test_builder_chain() {
        let cfg: ExecutorConfig<u32> = ExecutorConfig::new()
            .max_concurrency(4)
            .group_concurrency("fetch", 2)
            .max_retries(3)
            .stop_on_error(true)
            .timeout(Duration::from_secs(30));
        assert_eq!(cfg.max_concurrency, Some(4));
        assert_eq!(cfg.group_concurrency.get("fetch"), Some(&2));
        assert_eq!(cfg.max_retries, 3);
        assert!(cfg.stop_on_error);
        assert_eq!(cfg.timeout, Some(Duration::from_secs(30)));
    }
}
