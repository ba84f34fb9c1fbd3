//! Identifier types shared across detectors.

use std::fmt;

/// Application identity that owns audio streams and tasks.
///
/// Resolved from an owner (package) name. Non-positive values are reserved by
/// the platform and never identify an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectId(pub i32);

impl SubjectId {
    /// Whether this id can identify an application.
    pub fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque task identifier from the task stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub i32);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_validity() {
        assert!(SubjectId(10_123).is_valid());
        assert!(!SubjectId(0).is_valid());
        assert!(!SubjectId(-1).is_valid());
    }
}
