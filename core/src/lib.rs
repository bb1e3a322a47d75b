//! armature-core: the concurrent task execution and progress tracking core
//! behind the `armature` scaffolding CLI.
//!
//! Two independent pieces, typically driven together by a caller:
//! [`executor::TaskExecutor`] runs groups of async work under concurrency
//! ceilings with retry, timeout, and cancellation; [`progress::ProgressManager`]
//! renders live per-group progress. The scaffolding builder submits
//! version-resolution and file-generation tasks to the executor and feeds
//! its completion callbacks into a progress manager it owns.

pub mod error;
pub mod executor;
pub mod progress;

pub use error::{ExecutorError, TaskError};
pub use executor::{ExecutorConfig, TaskDescriptor, TaskExecutor, TaskInfo, TaskReport, DEFAULT_GROUP};
pub use progress::{GroupProgress, ProgressManager, ProgressMode, ProgressSnapshot};
