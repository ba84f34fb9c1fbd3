//! Task and foreground state types.

use std::fmt;

use crate::types::{SubjectId, TaskId};

/// How a task's windows are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WindowingMode {
    #[default]
    Undefined,
    /// Plain fullscreen.
    Fullscreen,
    /// Picture-in-picture.
    Pinned,
    /// Split screen and other multi-window layouts.
    MultiWindow,
    /// Desktop-style free windows.
    Freeform,
}

impl WindowingMode {
    /// Whether the task owns the whole display (not pinned, split or
    /// freeform).
    pub fn is_exclusive_fullscreen(self) -> bool {
        self == WindowingMode::Fullscreen
    }
}

impl fmt::Display for WindowingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowingMode::Undefined => write!(f, "undefined"),
            WindowingMode::Fullscreen => write!(f, "fullscreen"),
            WindowingMode::Pinned => write!(f, "pinned"),
            WindowingMode::MultiWindow => write!(f, "multi-window"),
            WindowingMode::Freeform => write!(f, "freeform"),
        }
    }
}

/// The top task as reported by the task source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskInfo {
    pub task_id: TaskId,
    /// Package of the task's top activity.
    pub top_package: Option<String>,
    /// Package of the task's root activity.
    pub base_package: Option<String>,
    pub windowing_mode: WindowingMode,
}

impl TaskInfo {
    /// Creates a fullscreen task whose top activity belongs to `package`.
    pub fn fullscreen(task_id: TaskId, package: impl Into<String>) -> Self {
        Self {
            task_id,
            top_package: Some(package.into()),
            base_package: None,
            windowing_mode: WindowingMode::Fullscreen,
        }
    }

    /// Sets the windowing mode.
    pub fn with_windowing_mode(mut self, mode: WindowingMode) -> Self {
        self.windowing_mode = mode;
        self
    }

    /// Owner of the task: the top activity's package, falling back to the
    /// root activity's.
    pub fn owner_name(&self) -> Option<&str> {
        self.top_package
            .as_deref()
            .or(self.base_package.as_deref())
    }
}

/// What is currently in the foreground.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForegroundState {
    pub task_id: Option<TaskId>,
    pub owner_name: Option<String>,
    pub subject: Option<SubjectId>,
    pub is_exclusive_fullscreen: bool,
}

impl ForegroundState {
    /// Nothing in the foreground.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether both the task and its owning subject are known.
    pub fn is_valid(&self) -> bool {
        self.task_id.is_some() && self.subject.is_some()
    }
}
