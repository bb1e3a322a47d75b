use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use super::handle::GroupProgress;

/// Rendering style shared by every group a manager tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgressMode {
    /// Single evolving status line per group.
    #[default]
    Spinner,
    /// Bounded percentage bar per group.
    Bar,
}

/// Snapshot of one group's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub group: String,
    pub completed: u64,
    pub total: u64,
    /// `round(completed / total * 100)`; a zero total counts as 100,
    /// treating "nothing to do" as done.
    pub percent: u8,
    pub failed: bool,
    pub fail_message: Option<String>,
}

type ObserverFn = Arc<dyn Fn(&ProgressSnapshot) + Send + Sync>;

/// Tracks completed/total counts per named group and drives a live
/// terminal indicator for each.
///
/// Best-effort observability: every operation on an unknown group is a
/// silent no-op, and a failed group ignores further progress mutation
/// (failure is sticky). Cheap to clone; clones share state.
pub struct ProgressManager {
    inner: Arc<Mutex<ManagerState>>,
}

impl Clone for ProgressManager {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ManagerState {
    mode: ProgressMode,
    enabled: bool,
    multi: MultiProgress,
    groups: HashMap<String, GroupEntry>,
    observers: Vec<ObserverFn>,
}

struct GroupEntry {
    total: u64,
    completed: u64,
    failed: bool,
    fail_message: Option<String>,
    /// The one live render resource for the group; `None` once torn down.
    bar: Option<ProgressBar>,
}

impl GroupEntry {
    fn percent(&self) -> u8 {
        if self.total == 0 {
            return 100;
        }
        let percent = (self.completed as f64 / self.total as f64 * 100.0).round();
        percent.min(100.0) as u8
    }

    fn snapshot(&self, group: &str) -> ProgressSnapshot {
        ProgressSnapshot {
            group: group.to_string(),
            completed: self.completed,
            total: self.total,
            percent: self.percent(),
            failed: self.failed,
            fail_message: self.fail_message.clone(),
        }
    }
}

impl ProgressManager {
    /// Create a manager. `enabled: false` keeps all counters live but
    /// renders nothing (hidden bars) - for quiet mode, machine-readable
    /// output, and tests.
    pub fn new(mode: ProgressMode, enabled: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManagerState {
                mode,
                enabled,
                multi: MultiProgress::new(),
                groups: HashMap::new(),
                observers: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ManagerState> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Narrowed view of a single group; the holder cannot touch others.
    pub fn handle(&self, group: impl Into<String>) -> GroupProgress {
        GroupProgress::new(self.clone(), group.into())
    }

    /// (Re)initialize a group: counters to zero, failure cleared, and a
    /// fresh render resource replacing any prior one.
    pub fn init(&self, group: &str, total: u64) {
        let snapshot = {
            let mut st = self.state();
            if let Some(previous) = st.groups.remove(group) {
                if let Some(bar) = previous.bar {
                    bar.finish_and_clear();
                }
            }
            let bar = st.make_bar(group, total);
            st.groups.insert(
                group.to_string(),
                GroupEntry {
                    total,
                    completed: 0,
                    failed: false,
                    fail_message: None,
                    bar: Some(bar),
                },
            );
            // A zero total is complete on arrival.
            st.refresh(group)
        };
        if let Some(snapshot) = snapshot {
            self.emit(&snapshot);
        }
    }

    /// Change a group's denominator without resetting its progress.
    pub fn update_total(&self, group: &str, total: u64) {
        self.mutate(group, |entry| entry.total = total);
    }

    pub fn increment(&self, group: &str) {
        self.increment_by(group, 1);
    }

    pub fn increment_by(&self, group: &str, amount: u64) {
        self.mutate(group, |entry| {
            entry.completed = (entry.completed + amount).min(entry.total);
        });
    }

    pub fn set(&self, group: &str, completed: u64) {
        self.mutate(group, |entry| entry.completed = completed.min(entry.total));
    }

    /// Mark a group fully done.
    pub fn complete(&self, group: &str) {
        self.mutate(group, |entry| entry.completed = entry.total);
    }

    pub fn complete_all(&self) {
        for group in self.tracked_groups() {
            self.complete(&group);
        }
    }

    /// Sticky failure marker: progress mutation on the group stops, its
    /// render resource is torn down with a failure indicator. Calling
    /// `fail` again on a failed group is a no-op.
    pub fn fail(&self, group: &str, message: Option<&str>) {
        let snapshot = {
            let mut st = self.state();
            let mode = st.mode;
            let Some(entry) = st.groups.get_mut(group) else {
                return;
            };
            if entry.failed {
                return;
            }
            entry.failed = true;
            entry.fail_message = message.map(str::to_string);
            if let Some(bar) = entry.bar.take() {
                match mode {
                    ProgressMode::Bar => bar.finish_and_clear(),
                    ProgressMode::Spinner => {
                        let suffix = message.map(|m| format!(": {m}")).unwrap_or_default();
                        bar.finish_with_message(format!("❌ {group}{suffix}"));
                    }
                }
            }
            entry.snapshot(group)
        };
        self.emit(&snapshot);
    }

    pub fn fail_all(&self, message: Option<&str>) {
        for group in self.tracked_groups() {
            self.fail(&group, message);
        }
    }

    /// Drop one group's tracked state and render resource.
    pub fn reset(&self, group: &str) {
        let mut st = self.state();
        if let Some(entry) = st.groups.remove(group) {
            if let Some(bar) = entry.bar {
                bar.finish_and_clear();
            }
        }
    }

    /// Drop every group.
    pub fn reset_all(&self) {
        let mut st = self.state();
        for (_, entry) in st.groups.drain() {
            if let Some(bar) = entry.bar {
                bar.finish_and_clear();
            }
        }
    }

    /// `None` if the group is not tracked.
    pub fn get_progress(&self, group: &str) -> Option<ProgressSnapshot> {
        self.state().groups.get(group).map(|e| e.snapshot(group))
    }

    pub fn get_all_progress(&self) -> Vec<ProgressSnapshot> {
        let st = self.state();
        let mut all: Vec<_> = st
            .groups
            .iter()
            .map(|(group, entry)| entry.snapshot(group))
            .collect();
        all.sort_by(|a, b| a.group.cmp(&b.group));
        all
    }

    /// Register an observer invoked with the fresh snapshot on every
    /// mutation of any group.
    pub fn on_progress(&self, observer: impl Fn(&ProgressSnapshot) + Send + Sync + 'static) {
        self.state().observers.push(Arc::new(observer));
    }

    fn tracked_groups(&self) -> Vec<String> {
        self.state().groups.keys().cloned().collect()
    }

    fn mutate<F>(&self, group: &str, apply: F)
    where
        F: FnOnce(&mut GroupEntry),
    {
        let snapshot = {
            let mut st = self.state();
            let Some(entry) = st.groups.get_mut(group) else {
                return;
            };
            if entry.failed {
                return;
            }
            apply(entry);
            st.refresh(group)
        };
        if let Some(snapshot) = snapshot {
            self.emit(&snapshot);
        }
    }

    /// Observers run without the lock held so they may call back in.
    fn emit(&self, snapshot: &ProgressSnapshot) {
        let observers = self.state().observers.clone();
        for observer in observers {
            observer(snapshot);
        }
    }

    #[cfg(test)]
    fn live_render_resources(&self, group: &str) -> usize {
        self.state()
            .groups
            .get(group)
            .map(|entry| usize::from(entry.bar.is_some()))
            .unwrap_or(0)
    }
}

impl ManagerState {
    fn make_bar(&self, group: &str, total: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }
        match self.mode {
            ProgressMode::Bar => {
                let bar = self.multi.add(ProgressBar::new(total));
                bar.set_style(
                    ProgressStyle::default_bar()
                        .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
                        .unwrap()
                        .progress_chars("█▓▒░  "),
                );
                bar.set_message(group.to_string());
                bar
            }
            ProgressMode::Spinner => {
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("  {spinner:.green} {msg}")
                        .unwrap()
                        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
                );
                bar.set_message(format!("⏳ {group} 0/{total}"));
                bar.enable_steady_tick(Duration::from_millis(100));
                bar
            }
        }
    }

    /// Push the entry's counters into its render resource, tearing the
    /// resource down once the group reaches 100%.
    fn refresh(&mut self, group: &str) -> Option<ProgressSnapshot> {
        let mode = self.mode;
        let entry = self.groups.get_mut(group)?;
        let snapshot = entry.snapshot(group);
        if entry.completed >= entry.total {
            if let Some(bar) = entry.bar.take() {
                match mode {
                    ProgressMode::Bar => bar.finish_and_clear(),
                    ProgressMode::Spinner => {
                        bar.finish_with_message(format!(
                            "✅ {group} {}/{}",
                            entry.completed, entry.total
                        ));
                    }
                }
            }
        } else if let Some(bar) = &entry.bar {
            match mode {
                ProgressMode::Bar => {
                    bar.set_length(entry.total);
                    bar.set_position(entry.completed);
                }
                ProgressMode::Spinner => {
                    bar.set_message(format!(
                        "⏳ {group} {}/{} ({}%)",
                        entry.completed,
                        entry.total,
                        snapshot.percent
                    ));
                }
            }
        }
        Some(snapshot)
    }
}

impl Drop for ManagerState {
    fn drop(&mut self) {
        for (_, entry) in self.groups.drain() {
            if let Some(bar) = entry.bar {
                bar.finish_and_clear();
            }
        }
    }
}
