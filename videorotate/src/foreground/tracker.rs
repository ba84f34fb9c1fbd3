//! Foreground task tracking.
//!
//! Every task-stack signal is treated as "the top task may have changed": the
//! tracker re-reads the single top task, resolves its owner to a subject and
//! recomputes whether it owns the whole display. Lookup failures degrade to
//! "nothing in foreground" and never reach the caller.

use std::sync::Arc;

use super::identity::IdentityCache;
use super::task::{ForegroundState, TaskInfo};
use crate::sources::{ForegroundTaskSource, IdentityResolver};
use crate::types::TaskId;

/// Tracks the current foreground task and its owning subject.
pub struct ForegroundTracker {
    source: Arc<dyn ForegroundTaskSource>,
    identities: IdentityCache,
    state: ForegroundState,
}

impl ForegroundTracker {
    pub fn new(source: Arc<dyn ForegroundTaskSource>, resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            source,
            identities: IdentityCache::new(resolver),
            state: ForegroundState::none(),
        }
    }

    /// Current foreground state.
    pub fn state(&self) -> &ForegroundState {
        &self.state
    }

    /// A task-stack-changed signal.
    pub fn on_task_stack_changed(&mut self) -> bool {
        self.refresh()
    }

    /// A task was moved to the front.
    pub fn on_task_moved_to_front(&mut self, task_id: TaskId) -> bool {
        tracing::trace!(task_id = %task_id, "Task moved to front");
        self.refresh()
    }

    /// A task was removed from the stack.
    pub fn on_task_removed(&mut self, task_id: TaskId) -> bool {
        tracing::trace!(task_id = %task_id, "Task removed");
        self.refresh()
    }

    /// Re-reads the top task. Returns `true` if the foreground task or owner
    /// changed.
    pub fn refresh(&mut self) -> bool {
        let top = match self.source.current_top_task() {
            Ok(top) => top,
            Err(err) => {
                tracing::warn!(error = %err, "Top task query failed");
                None
            }
        };

        let next = match top {
            Some(task) => self.describe(&task),
            None => ForegroundState::none(),
        };

        let changed =
            next.task_id != self.state.task_id || next.owner_name != self.state.owner_name;
        if changed {
            tracing::debug!(
                task_id = ?next.task_id.map(|t| t.0),
                owner = next.owner_name.as_deref().unwrap_or("-"),
                subject = ?next.subject.map(|s| s.0),
                fullscreen = next.is_exclusive_fullscreen,
                "Top task changed"
            );
        }
        self.state = next;
        changed
    }

    fn describe(&mut self, task: &TaskInfo) -> ForegroundState {
        let owner_name = task.owner_name().map(str::to_string);
        let subject = owner_name
            .as_deref()
            .and_then(|name| self.identities.resolve(name));

        ForegroundState {
            task_id: Some(task.task_id),
            owner_name,
            subject,
            is_exclusive_fullscreen: task.windowing_mode.is_exclusive_fullscreen(),
        }
    }

    /// Forgets the foreground and the identity cache.
    pub fn reset(&mut self) {
        self.state = ForegroundState::none();
        self.identities.clear();
    }
}

impl std::fmt::Debug for ForegroundTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForegroundTracker")
            .field("state", &self.state)
            .field("identities", &self.identities)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::ControlSender;
    use crate::error::SourceError;
    use crate::foreground::WindowingMode;
    use crate::sources::Subscription;
    use crate::types::SubjectId;
    use parking_lot::Mutex;

    struct FakeTasks {
        top: Mutex<Result<Option<TaskInfo>, SourceError>>,
    }

    impl FakeTasks {
        fn set(&self, top: Result<Option<TaskInfo>, SourceError>) {
            *self.top.lock() = top;
        }
    }

    impl ForegroundTaskSource for FakeTasks {
        fn current_top_task(&self) -> Result<Option<TaskInfo>, SourceError> {
            self.top.lock().clone()
        }

        fn subscribe(&self, _sender: ControlSender) -> Result<Subscription, SourceError> {
            Ok(Subscription::detached("tasks"))
        }
    }

    struct Packages;

    impl IdentityResolver for Packages {
        fn resolve(&self, owner_name: &str) -> Result<SubjectId, SourceError> {
            match owner_name {
                "com.example.video" => Ok(SubjectId(10_061)),
                "com.example.browser" => Ok(SubjectId(10_062)),
                other => Err(SourceError::NotFound(other.to_string())),
            }
        }
    }

    fn tracker() -> (ForegroundTracker, Arc<FakeTasks>) {
        let tasks = Arc::new(FakeTasks {
            top: Mutex::new(Ok(None)),
        });
        (ForegroundTracker::new(tasks.clone(), Arc::new(Packages)), tasks)
    }

    #[test]
    fn test_initial_state_is_none() {
        let (tracker, _) = tracker();
        assert_eq!(tracker.state(), &ForegroundState::none());
    }

    #[test]
    fn test_resolves_top_task() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(42), "com.example.video"))));

        assert!(tracker.on_task_stack_changed());
        let state = tracker.state();
        assert_eq!(state.task_id, Some(TaskId(42)));
        assert_eq!(state.subject, Some(SubjectId(10_061)));
        assert!(state.is_exclusive_fullscreen);
        assert!(state.is_valid());
    }

    #[test]
    fn test_unchanged_top_reports_no_change() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(42), "com.example.video"))));
        assert!(tracker.refresh());
        assert!(!tracker.on_task_moved_to_front(TaskId(42)));
    }

    #[test]
    fn test_windowing_mode_is_recomputed() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(42), "com.example.video"))));
        tracker.refresh();

        tasks.set(Ok(Some(
            TaskInfo::fullscreen(TaskId(42), "com.example.video")
                .with_windowing_mode(WindowingMode::Pinned),
        )));
        tracker.refresh();
        assert!(!tracker.state().is_exclusive_fullscreen);
    }

    #[test]
    fn test_query_failure_degrades_to_none() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(42), "com.example.video"))));
        tracker.refresh();

        tasks.set(Err(SourceError::Query("binder died".to_string())));
        assert!(tracker.on_task_removed(TaskId(42)));
        assert_eq!(tracker.state(), &ForegroundState::none());
    }

    #[test]
    fn test_unknown_owner_has_no_subject() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(7), "com.example.unknown"))));
        tracker.refresh();

        let state = tracker.state();
        assert_eq!(state.task_id, Some(TaskId(7)));
        assert_eq!(state.subject, None);
        assert!(!state.is_valid());
    }

    #[test]
    fn test_reset() {
        let (mut tracker, tasks) = tracker();
        tasks.set(Ok(Some(TaskInfo::fullscreen(TaskId(42), "com.example.browser"))));
        tracker.refresh();
        tracker.reset();
        assert_eq!(tracker.state(), &ForegroundState::none());
    }
}
