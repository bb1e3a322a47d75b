//! Concurrency-bounded task execution.
//!
//! This module provides a generic scheduler for running N heterogeneous
//! async units of work with bounded concurrency, retries, timeouts, and
//! live cancellation. It supports:
//! - Per-group concurrency ceilings (a global default plus named overrides)
//! - Retry with a fixed delay between attempts
//! - Per-task timeouts racing the task body against a timer
//! - Pause/resume of dispatch
//! - Two-level cooperative cancellation: global and per group
//! - Fail-fast runs (`stop_on_error`) that cancel all remaining work
//!
//! # Architecture
//!
//! ```text
//! Vec<TaskDescriptor<T>>
//!   ↓
//! TaskExecutor::new() → queue
//!   ↓
//! pump() - greedy dispatch while groups are under their ceilings
//!   ↓
//! run_task() - cancel check → body vs timeout vs tokens → retry loop
//!   ↓
//! finalize() - report, callbacks, re-dispatch
//!   ↓
//! run() → Vec<TaskReport<T>> (completion order)
//! ```

mod config;
mod engine;
mod result;
mod task;

pub use config::{
    CompleteCallback, ErrorCallback, ExecutorConfig, ProgressCallback, SuccessCallback,
};
pub use engine::TaskExecutor;
pub use result::TaskReport;
pub use task::{TaskDescriptor, TaskFn, TaskInfo, DEFAULT_GROUP};
