use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::{ExecutorError, TaskError};

use super::config::ExecutorConfig;
use super::result::TaskReport;
use super::task::{TaskDescriptor, TaskInfo};

/// Concurrency-bounded, retryable, cancellable task executor.
///
/// Runs a heterogeneous collection of async tasks to completion, respecting
/// per-group concurrency ceilings, with retry, timeout, pause/resume, and
/// two-level cancellation (global and per group). Results are collected in
/// completion order.
///
/// Cheap to clone; all clones share the same queue, state, and results.
pub struct TaskExecutor<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for TaskExecutor<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    config: ExecutorConfig<T>,
    state: Mutex<ExecState<T>>,
    /// Bumped after every finalization and cancellation; `run()` waits on it.
    settled: watch::Sender<u64>,
}

struct ExecState<T> {
    queue: VecDeque<Queued<T>>,
    running: HashMap<u64, TaskInfo>,
    results: Vec<TaskReport<T>>,
    /// Active-count per group, adjusted in exactly two places: admission
    /// (+1) and finalization (-1).
    active: HashMap<String, usize>,
    group_tokens: HashMap<String, CancellationToken>,
    stop_token: CancellationToken,
    next_seq: u64,
    running_flag: bool,
    paused: bool,
    should_stop: bool,
    abort: Option<ExecutorError>,
}

struct Queued<T> {
    seq: u64,
    task: TaskDescriptor<T>,
}

impl<T> Inner<T> {
    fn state(&self) -> MutexGuard<'_, ExecState<T>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn wake(&self) {
        self.settled.send_modify(|n| *n = n.wrapping_add(1));
    }
}

impl<T: Clone + Send + 'static> TaskExecutor<T> {
    /// Create an executor holding `tasks`. With `auto_start` set in the
    /// config, `run()` is spawned onto the current runtime immediately, so
    /// construction must happen inside one.
    pub fn new(tasks: Vec<TaskDescriptor<T>>, config: ExecutorConfig<T>) -> Self {
        let auto_start = config.auto_start;
        let (settled, _) = watch::channel(0);
        let executor = Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(ExecState {
                    queue: VecDeque::new(),
                    running: HashMap::new(),
                    results: Vec::new(),
                    active: HashMap::new(),
                    group_tokens: HashMap::new(),
                    stop_token: CancellationToken::new(),
                    next_seq: 0,
                    running_flag: false,
                    paused: false,
                    should_stop: false,
                    abort: None,
                }),
                settled,
            }),
        };
        executor.add_tasks(tasks);
        if auto_start {
            let auto = executor.clone();
            tokio::spawn(async move {
                if let Err(err) = auto.run().await {
                    warn!("auto-started run aborted: {err}");
                }
            });
        }
        executor
    }

    /// Append a task to the queue. Always accepted; if a run is underway
    /// and dispatch is neither paused nor stopping, the scheduler
    /// immediately tries to start it.
    pub fn add_task(&self, task: TaskDescriptor<T>) {
        self.add_tasks([task]);
    }

    pub fn add_tasks(&self, tasks: impl IntoIterator<Item = TaskDescriptor<T>>) {
        let dispatch = {
            let mut st = self.inner.state();
            for task in tasks {
                let seq = st.next_seq;
                st.next_seq += 1;
                st.queue.push_back(Queued { seq, task });
            }
            st.running_flag && !st.paused && !st.should_stop
        };
        if dispatch {
            Self::pump(&self.inner);
        }
    }

    /// Stop admitting new tasks; in-flight tasks run to completion.
    /// Idempotent.
    pub fn pause(&self) {
        self.inner.state().paused = true;
    }

    /// Re-enable dispatch and fill the available concurrency slots.
    /// Idempotent.
    pub fn resume(&self) {
        self.inner.state().paused = false;
        Self::pump(&self.inner);
    }

    /// Signal every task, queued or in flight, to settle as cancelled and
    /// halt all further dispatch. Harmless when nothing is running.
    pub fn cancel(&self) {
        {
            let mut st = self.inner.state();
            st.should_stop = true;
            st.stop_token.cancel();
        }
        self.inner.wake();
    }

    /// Cancel a single group: its in-flight tasks settle as cancelled and
    /// its queued tasks drain as cancelled. Other groups are unaffected.
    pub fn cancel_group(&self, group: &str) {
        {
            let mut st = self.inner.state();
            st.active.remove(group);
            let stop = st.stop_token.clone();
            st.group_tokens
                .entry(group.to_string())
                .or_insert_with(|| stop.child_token())
                .cancel();
        }
        Self::pump(&self.inner);
        self.inner.wake();
    }

    /// Drive the queue to completion and return the settled results.
    ///
    /// Idempotent while a run is underway: a second call reports what has
    /// settled so far without disturbing the run. Each new invocation
    /// starts from fresh cancellation tokens and an empty results list.
    /// With `stop_on_error`, the first task failure cancels the remaining
    /// work and surfaces here as `ExecutorError::Aborted`.
    pub async fn run(&self) -> Result<Vec<TaskReport<T>>, ExecutorError> {
        {
            let mut st = self.inner.state();
            if st.running_flag {
                return Ok(st.results.clone());
            }
            st.running_flag = true;
            st.should_stop = false;
            st.abort = None;
            st.stop_token = CancellationToken::new();
            st.group_tokens.clear();
            st.results.clear();
        }
        debug!("executor run started");
        Self::pump(&self.inner);

        let mut settled = self.inner.settled.subscribe();
        loop {
            {
                let st = self.inner.state();
                let drained = st.queue.is_empty() && st.running.is_empty();
                let stopped = st.should_stop && st.running.is_empty();
                if drained || stopped {
                    break;
                }
            }
            if settled.changed().await.is_err() {
                break;
            }
        }

        let mut st = self.inner.state();
        st.running_flag = false;
        st.active.clear();
        match st.abort.take() {
            Some(err) => {
                debug!("executor run aborted: {err}");
                Err(err)
            }
            None => Ok(st.results.clone()),
        }
    }

    /// Snapshot of the not-yet-started tasks, in queue order.
    pub fn queued_tasks(&self) -> Vec<TaskInfo> {
        self.inner
            .state()
            .queue
            .iter()
            .map(|q| q.task.info())
            .collect()
    }

    /// Snapshot of the tasks currently in flight.
    pub fn running_tasks(&self) -> Vec<TaskInfo> {
        self.inner.state().running.values().cloned().collect()
    }

    /// Snapshot of the settled results, in completion order.
    pub fn completed_results(&self) -> Vec<TaskReport<T>> {
        self.inner.state().results.clone()
    }

    pub fn is_paused(&self) -> bool {
        self.inner.state().paused
    }

    pub fn is_running(&self) -> bool {
        self.inner.state().running_flag
    }

    /// Greedy dispatcher: admit the earliest queued task whose group is
    /// under its ceiling and repeat until nothing more fits. Later-queued
    /// tasks in an under-capacity group overtake earlier tasks in a
    /// saturated one; order within a group is preserved.
    fn pump(inner: &Arc<Inner<T>>) {
        loop {
            let admitted = {
                let mut st = inner.state();
                if !st.running_flag || st.paused || st.should_stop {
                    return;
                }
                let position = st
                    .queue
                    .iter()
                    .position(|q| Self::has_capacity(&inner.config, &st, q.task.group()));
                let Some(position) = position else { return };
                let Some(queued) = st.queue.remove(position) else {
                    return;
                };
                let group = queued.task.group().to_string();
                *st.active.entry(group.clone()).or_insert(0) += 1;
                st.running.insert(queued.seq, queued.task.info());
                let stop = st.stop_token.clone();
                let fallback = stop.clone();
                let group_token = st
                    .group_tokens
                    .entry(group)
                    .or_insert_with(|| fallback.child_token())
                    .clone();
                (queued, stop, group_token)
            };
            let (queued, stop, group_token) = admitted;
            trace!(
                task = queued.task.label(),
                group = queued.task.group(),
                "task admitted"
            );
            let inner = Arc::clone(inner);
            tokio::spawn(async move {
                Self::run_task(inner, queued, stop, group_token).await;
            });
        }
    }

    fn has_capacity(config: &ExecutorConfig<T>, st: &ExecState<T>, group: &str) -> bool {
        let ceiling = config
            .group_concurrency
            .get(group)
            .copied()
            .or(config.max_concurrency);
        match ceiling {
            Some(limit) => st.active.get(group).copied().unwrap_or(0) < limit,
            None => true,
        }
    }

    async fn run_task(
        inner: Arc<Inner<T>>,
        queued: Queued<T>,
        stop: CancellationToken,
        group_token: CancellationToken,
    ) {
        let task = queued.task;
        let started = Instant::now();
        let timeout = effective_timeout(task.timeout(), inner.config.timeout);
        let mut retries: u32 = 0;

        let outcome = loop {
            // Admission may have raced a cancellation; settle without
            // running the body at all.
            if stop.is_cancelled() {
                break Err(TaskError::Stopped);
            }
            if group_token.is_cancelled() {
                break Err(TaskError::Cancelled);
            }

            let body = task.attempt();
            let attempt = async {
                match timeout {
                    Some(limit) => match tokio::time::timeout(limit, body).await {
                        Ok(result) => result.map_err(|e| TaskError::Failed(format!("{e:#}"))),
                        Err(_) => Err(TaskError::Timeout(limit)),
                    },
                    None => body.await.map_err(|e| TaskError::Failed(format!("{e:#}"))),
                }
            };

            let result = tokio::select! {
                biased;
                _ = stop.cancelled() => Err(TaskError::Stopped),
                _ = group_token.cancelled() => Err(TaskError::Cancelled),
                result = attempt => result,
            };

            match result {
                Ok(data) => break Ok(data),
                Err(err) if err.is_cancellation() => break Err(err),
                Err(err) => {
                    // A cancellation that landed during the attempt wins
                    // over retry handling.
                    if stop.is_cancelled() {
                        break Err(TaskError::Stopped);
                    }
                    if group_token.is_cancelled() {
                        break Err(TaskError::Cancelled);
                    }
                    if retries < inner.config.max_retries {
                        retries += 1;
                        trace!(
                            task = task.label(),
                            attempt = retries,
                            "retrying after failure: {err}"
                        );
                        tokio::time::sleep(inner.config.retry_delay).await;
                        continue;
                    }
                    break Err(err);
                }
            }
        };

        let duration_ms = started.elapsed().as_millis() as u64;
        Self::finalize(&inner, queued.seq, &task, outcome, retries, duration_ms);
    }

    fn finalize(
        inner: &Arc<Inner<T>>,
        seq: u64,
        task: &TaskDescriptor<T>,
        outcome: Result<T, TaskError>,
        retries: u32,
        duration_ms: u64,
    ) {
        let report = match outcome {
            Ok(data) => {
                TaskReport::succeeded(task.label(), task.group(), data, retries, duration_ms)
            }
            Err(err) => TaskReport::failed(task.label(), task.group(), err, retries, duration_ms),
        };

        let (completed, total) = {
            let mut st = inner.state();
            st.running.remove(&seq);
            // Tracking may already be gone if the group was cancelled
            // mid-flight.
            if let Some(count) = st.active.get_mut(task.group()) {
                *count = count.saturating_sub(1);
            }
            st.results.push(report.clone());
            let completed = st.results.len();
            let total = completed + st.running.len() + st.queue.len();

            let failure = report.error.clone().filter(|err| !err.is_cancellation());
            if let Some(source) = failure {
                if inner.config.stop_on_error && st.abort.is_none() {
                    debug!(task = report.label.as_str(), "failure aborts the run");
                    st.abort = Some(ExecutorError::Aborted {
                        label: report.label.clone(),
                        source,
                    });
                    st.should_stop = true;
                    st.stop_token.cancel();
                    // Abandoned tasks never execute and never produce a
                    // result.
                    st.queue.clear();
                }
            }
            (completed, total)
        };

        // Callbacks run without the state lock held, so they may re-enter
        // the executor (add_task, cancel, introspection).
        let config = &inner.config;
        if let Some(callback) = &config.on_progress {
            callback(completed, total, &report.group);
        }
        if let Some(callback) = &config.on_complete {
            callback(&report);
        }
        if let Some(data) = &report.data {
            if let Some(callback) = &config.on_success {
                callback(data, &report);
            }
        } else if let Some(err) = &report.error {
            if let Some(callback) = &config.on_error {
                callback(err, &report);
            }
        }

        Self::pump(inner);
        inner.wake();
    }
}

fn effective_timeout(task: Option<Duration>, default: Option<Duration>) -> Option<Duration> {
    task.or(default).filter(|limit| !limit.is_zero())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_timeout() {
        let default = Some(Duration::from_secs(5));
        assert_eq!(effective_timeout(None, default), default);
        assert_eq!(
            effective_timeout(Some(Duration::from_secs(1)), default),
            Some(Duration::from_secs(1))
        );
        // Zero disables the timeout even when a default exists.
        assert_eq!(effective_timeout(Some(Duration::ZERO), default), None);
        assert_eq!(effective_timeout(None, None), None);
    }
}
