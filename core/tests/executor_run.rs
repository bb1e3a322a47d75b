use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use armature_core::{ExecutorConfig, ExecutorError, TaskDescriptor, TaskError, TaskExecutor};

/// Tracks the highest number of bodies simultaneously inside a region.
#[derive(Default)]
struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

fn sleeper(label: &str, group: &str, gauge: Arc<Gauge>, delay: Duration) -> TaskDescriptor<u32> {
    TaskDescriptor::new(label, move || {
        let gauge = gauge.clone();
        async move {
            gauge.enter();
            tokio::time::sleep(delay).await;
            gauge.exit();
            Ok(1)
        }
    })
    .in_group(group)
}

#[tokio::test]
async fn concurrency_ceiling_is_never_exceeded() {
    let gauge = Arc::new(Gauge::default());
    let tasks: Vec<_> = (0..6)
        .map(|i| {
            sleeper(
                &format!("task-{i}"),
                "default",
                gauge.clone(),
                Duration::from_millis(30),
            )
        })
        .collect();

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new().max_concurrency(2));
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.success));
    assert!(gauge.peak() <= 2, "peak concurrency was {}", gauge.peak());
}

#[tokio::test]
async fn every_task_yields_exactly_one_result() {
    let tasks: Vec<_> = (0..5)
        .map(|i| {
            TaskDescriptor::new(format!("task-{i}"), move || async move {
                if i % 2 == 0 {
                    Ok(i)
                } else {
                    Err(anyhow::anyhow!("odd task"))
                }
            })
        })
        .collect();

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new());
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 5);
    let mut labels: Vec<_> = results.iter().map(|r| r.label.clone()).collect();
    labels.sort();
    labels.dedup();
    assert_eq!(labels.len(), 5);
    assert_eq!(results.iter().filter(|r| r.success).count(), 3);
    assert_eq!(results.iter().filter(|r| !r.success).count(), 2);
}

#[tokio::test]
async fn retries_count_attempts_before_success() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let task = TaskDescriptor::new("flaky", move || {
        let counter = counter.clone();
        async move {
            // Fail the first two attempts, succeed on the third.
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(anyhow::anyhow!("not yet"))
            } else {
                Ok(42u32)
            }
        }
    });

    let executor = TaskExecutor::new(
        vec![task],
        ExecutorConfig::new()
            .max_retries(3)
            .retry_delay(Duration::from_millis(5)),
    );
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].data, Some(42));
    assert_eq!(results[0].retries, 2);
}

#[tokio::test]
async fn exhausted_retries_report_the_configured_maximum() {
    let task = TaskDescriptor::new("hopeless", || async { Err::<u32, _>(anyhow::anyhow!("no")) });

    let executor = TaskExecutor::new(
        vec![task],
        ExecutorConfig::new()
            .max_retries(2)
            .retry_delay(Duration::from_millis(5)),
    );
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(!results[0].success);
    assert_eq!(results[0].retries, 2);
    assert!(matches!(results[0].error, Some(TaskError::Failed(_))));
}

#[tokio::test]
async fn timeout_fails_the_task_instead_of_hanging() {
    let task = TaskDescriptor::new("stuck", || async {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(0u32)
    })
    .with_timeout(Duration::from_millis(100));

    let started = Instant::now();
    let executor = TaskExecutor::new(vec![task], ExecutorConfig::new());
    let results = executor.run().await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(results.len(), 1);
    assert!(matches!(results[0].error, Some(TaskError::Timeout(_))));
}

#[tokio::test]
async fn timeouts_are_retried_like_failures() {
    let attempts = Arc::new(AtomicU32::new(0));
    let counter = attempts.clone();
    let task = TaskDescriptor::new("slow-then-quick", move || {
        let counter = counter.clone();
        async move {
            // First attempt exceeds the timeout, the retry returns at once.
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            Ok(9u32)
        }
    })
    .with_timeout(Duration::from_millis(60));

    let executor = TaskExecutor::new(
        vec![task],
        ExecutorConfig::new()
            .max_retries(1)
            .retry_delay(Duration::from_millis(5)),
    );
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert_eq!(results[0].retries, 1);
}

#[tokio::test]
async fn zero_timeout_means_no_timeout() {
    let task = TaskDescriptor::new("slowish", || async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        Ok(7u32)
    })
    .with_timeout(Duration::ZERO);

    let executor = TaskExecutor::new(
        vec![task],
        ExecutorConfig::new().timeout(Duration::from_millis(1)),
    );
    let results = executor.run().await.unwrap();
    assert!(results[0].success);
}

#[tokio::test]
async fn stop_on_error_aborts_and_abandons_the_queue() {
    let tasks: Vec<_> = (1..=5)
        .map(|i| {
            TaskDescriptor::new(format!("task-{i}"), move || async move {
                if i == 2 {
                    Err(anyhow::anyhow!("task 2 exploded"))
                } else {
                    Ok(i)
                }
            })
        })
        .collect();

    let executor = TaskExecutor::new(
        tasks,
        ExecutorConfig::new().max_concurrency(1).stop_on_error(true),
    );
    let err = executor.run().await.unwrap_err();

    let ExecutorError::Aborted { label, source } = err;
    assert_eq!(label, "task-2");
    assert!(matches!(source, TaskError::Failed(_)));

    let results = executor.completed_results();
    assert!(results.iter().any(|r| r.label == "task-1" && r.success));
    assert!(results.iter().any(|r| r.label == "task-2" && !r.success));
    // Tasks 3-5 were abandoned before starting.
    for i in 3..=5 {
        assert!(!results.iter().any(|r| r.label == format!("task-{i}")));
    }
}

#[tokio::test]
async fn group_cancellation_leaves_other_groups_alone() {
    let gauge = Arc::new(Gauge::default());
    let mut tasks = Vec::new();
    for i in 0..3 {
        tasks.push(sleeper(
            &format!("a-{i}"),
            "a",
            gauge.clone(),
            Duration::from_millis(500),
        ));
        tasks.push(sleeper(
            &format!("b-{i}"),
            "b",
            gauge.clone(),
            Duration::from_millis(40),
        ));
    }

    let executor = TaskExecutor::new(
        tasks,
        ExecutorConfig::new()
            .group_concurrency("a", 1)
            .group_concurrency("b", 1),
    );
    let runner = executor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(60)).await;
    executor.cancel_group("a");

    let results = handle.await.unwrap().unwrap();
    assert_eq!(results.len(), 6);
    for report in &results {
        if report.group == "a" {
            assert_eq!(report.error, Some(TaskError::Cancelled), "{}", report.label);
        } else {
            assert!(report.success, "{} should have finished", report.label);
        }
    }
}

#[tokio::test]
async fn global_cancel_settles_in_flight_work_as_stopped() {
    let gauge = Arc::new(Gauge::default());
    let tasks: Vec<_> = (0..4)
        .map(|i| {
            sleeper(
                &format!("task-{i}"),
                "default",
                gauge.clone(),
                Duration::from_millis(500),
            )
        })
        .collect();

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new().max_concurrency(2));
    let runner = executor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(50)).await;
    executor.cancel();

    let results = handle.await.unwrap().unwrap();
    // The two in-flight tasks settle as stopped; the two queued ones were
    // never dispatched.
    assert_eq!(results.len(), 2);
    for report in &results {
        assert_eq!(report.error, Some(TaskError::Stopped));
    }
    assert_eq!(executor.queued_tasks().len(), 2);
}

#[tokio::test]
async fn cancel_with_nothing_running_is_harmless() {
    let executor: TaskExecutor<u32> = TaskExecutor::new(Vec::new(), ExecutorConfig::new());
    executor.cancel();
    executor.cancel_group("ghost");
    let results = executor.run().await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn pause_blocks_dispatch_until_resume() {
    let tasks: Vec<_> = (0..3)
        .map(|i| {
            TaskDescriptor::new(format!("task-{i}"), || async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(1u32)
            })
        })
        .collect();

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new().max_concurrency(1));
    executor.pause();
    assert!(executor.is_paused());

    let runner = executor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(60)).await;
    assert!(executor.completed_results().is_empty());
    assert_eq!(executor.queued_tasks().len(), 3);

    executor.resume();
    let results = handle.await.unwrap().unwrap();
    assert_eq!(results.len(), 3);
}

#[tokio::test]
async fn tasks_added_mid_run_are_picked_up() {
    let tasks = vec![TaskDescriptor::new("first", || async {
        tokio::time::sleep(Duration::from_millis(80)).await;
        Ok(1u32)
    })];

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new());
    let runner = executor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(executor.is_running());
    executor.add_task(TaskDescriptor::new("second", || async { Ok(2u32) }));

    let results = handle.await.unwrap().unwrap();
    assert_eq!(results.len(), 2);
}

#[tokio::test]
async fn run_is_idempotent_while_running() {
    let tasks = vec![TaskDescriptor::new("only", || async {
        tokio::time::sleep(Duration::from_millis(80)).await;
        Ok(1u32)
    })];

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new());
    let runner = executor.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    // A second call must not disturb the run; it reports what has settled.
    let snapshot = executor.run().await.unwrap();
    assert!(snapshot.is_empty());

    let results = handle.await.unwrap().unwrap();
    assert_eq!(results.len(), 1);
}

#[tokio::test]
async fn auto_start_runs_without_an_explicit_run_call() {
    let tasks = vec![TaskDescriptor::new("auto", || async { Ok(5u32) })];
    let executor = TaskExecutor::new(tasks, ExecutorConfig::new().auto_start(true));

    tokio::time::sleep(Duration::from_millis(100)).await;

    let results = executor.completed_results();
    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert!(!executor.is_running());
}

#[tokio::test]
async fn results_are_ordered_by_completion_time() {
    let tasks = vec![
        TaskDescriptor::new("slow", || async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok(1u32)
        }),
        TaskDescriptor::new("fast", || async { Ok(2u32) }),
    ];

    let executor = TaskExecutor::new(tasks, ExecutorConfig::new());
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].label, "fast");
    assert_eq!(results[1].label, "slow");
}

#[tokio::test]
async fn callbacks_fire_per_completion() {
    let progressed = Arc::new(AtomicUsize::new(0));
    let succeeded = Arc::new(AtomicUsize::new(0));
    let errored = Arc::new(AtomicUsize::new(0));

    let tasks: Vec<_> = (0..4)
        .map(|i| {
            TaskDescriptor::new(format!("task-{i}"), move || async move {
                if i == 3 {
                    Err(anyhow::anyhow!("last one fails"))
                } else {
                    Ok(i)
                }
            })
        })
        .collect();

    let p = progressed.clone();
    let s = succeeded.clone();
    let e = errored.clone();
    let config = ExecutorConfig::new()
        .max_concurrency(1)
        .on_progress(move |completed, total, _group| {
            assert!(completed <= total);
            p.fetch_add(1, Ordering::SeqCst);
        })
        .on_success(move |_, _| {
            s.fetch_add(1, Ordering::SeqCst);
        })
        .on_error(move |_, _| {
            e.fetch_add(1, Ordering::SeqCst);
        });

    let executor = TaskExecutor::new(tasks, config);
    executor.run().await.unwrap();

    assert_eq!(progressed.load(Ordering::SeqCst), 4);
    assert_eq!(succeeded.load(Ordering::SeqCst), 3);
    assert_eq!(errored.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn two_group_scaffold_respects_both_ceilings() {
    #[derive(Clone, Copy)]
    struct Span {
        start: Instant,
        end: Instant,
    }

    let fetch_gauge = Arc::new(Gauge::default());
    let write_spans: Arc<Mutex<Vec<Span>>> = Arc::new(Mutex::new(Vec::new()));

    let mut tasks = Vec::new();
    for i in 0..3 {
        tasks.push(sleeper(
            &format!("fetch-{i}"),
            "fetch",
            fetch_gauge.clone(),
            Duration::from_millis(100),
        ));
    }
    for i in 0..3 {
        let spans = write_spans.clone();
        tasks.push(
            TaskDescriptor::new(format!("write-{i}"), move || {
                let spans = spans.clone();
                async move {
                    let start = Instant::now();
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    spans.lock().unwrap().push(Span {
                        start,
                        end: Instant::now(),
                    });
                    Ok(1u32)
                }
            })
            .in_group("write"),
        );
    }

    let executor = TaskExecutor::new(
        tasks,
        ExecutorConfig::new()
            .group_concurrency("fetch", 2)
            .group_concurrency("write", 1),
    );
    let results = executor.run().await.unwrap();

    assert_eq!(results.len(), 6);
    assert!(results.iter().all(|r| r.success));
    // Both fetch slots were actually used, never more.
    assert_eq!(fetch_gauge.peak(), 2);

    // Write tasks never overlap in wall-clock time.
    let mut spans = write_spans.lock().unwrap().clone();
    spans.sort_by_key(|s| s.start);
    assert_eq!(spans.len(), 3);
    for pair in spans.windows(2) {
        assert!(
            pair[1].start >= pair[0].end,
            "write tasks overlapped in execution"
        );
    }
}
