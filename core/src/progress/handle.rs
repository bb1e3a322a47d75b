use super::manager::{ProgressManager, ProgressSnapshot};

/// Narrowed view of one progress group.
///
/// Handed to code responsible for a single phase of work so it cannot
/// mutate unrelated groups.
#[derive(Clone)]
pub struct GroupProgress {
    manager: ProgressManager,
    group: String,
}

impl GroupProgress {
    pub(crate) fn new(manager: ProgressManager, group: String) -> Self {
        Self { manager, group }
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn init(&self, total: u64) {
        self.manager.init(&self.group, total);
    }

    pub fn update_total(&self, total: u64) {
        self.manager.update_total(&self.group, total);
    }

    pub fn increment(&self) {
        self.manager.increment(&self.group);
    }

    pub fn increment_by(&self, amount: u64) {
        self.manager.increment_by(&self.group, amount);
    }

    pub fn set(&self, completed: u64) {
        self.manager.set(&self.group, completed);
    }

    pub fn complete(&self) {
        self.manager.complete(&self.group);
    }

    pub fn fail(&self, message: Option<&str>) {
        self.manager.fail(&self.group, message);
    }

    pub fn snapshot(&self) -> Option<ProgressSnapshot> {
        self.manager.get_progress(&self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::super::manager::ProgressMode;
    use super::*;

    #[test]
    fn test_handle_is_scoped_to_its_group() {
        let manager = ProgressManager::new(ProgressMode::Spinner, false);
        manager.init("other", 5);
        let handle = manager.handle("mine");
        handle.init(2);
        handle.increment();
        assert_eq!(handle.snapshot().unwrap().completed, 1);
        // The sibling group is untouched.
        let other = manager.get_progress("other").unwrap();
        assert_eq!(other.completed, 0);
        assert_eq!(other.total, 5);
    }
}
