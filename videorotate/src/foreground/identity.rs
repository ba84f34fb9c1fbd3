//! Cached owner-name to subject-id resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::SourceError;
use crate::sources::IdentityResolver;
use crate::types::SubjectId;

/// Caches successful [`IdentityResolver`] lookups.
///
/// Names are assumed stable for the life of the process, so entries are never
/// evicted (only dropped wholesale by [`IdentityCache::clear`]). Failures are
/// not cached and resolve to `None`.
pub struct IdentityCache {
    resolver: Arc<dyn IdentityResolver>,
    entries: HashMap<String, SubjectId>,
}

impl IdentityCache {
    pub fn new(resolver: Arc<dyn IdentityResolver>) -> Self {
        Self {
            resolver,
            entries: HashMap::new(),
        }
    }

    /// Resolves `owner_name`, consulting the cache first.
    pub fn resolve(&mut self, owner_name: &str) -> Option<SubjectId> {
        if let Some(subject) = self.entries.get(owner_name) {
            return Some(*subject);
        }

        match self.resolver.resolve(owner_name) {
            Ok(subject) if subject.is_valid() => {
                self.entries.insert(owner_name.to_string(), subject);
                Some(subject)
            }
            Ok(subject) => {
                tracing::debug!(owner = owner_name, subject = %subject, "Resolved to invalid subject id");
                None
            }
            Err(SourceError::NotFound(_)) => None,
            Err(err) => {
                tracing::warn!(owner = owner_name, error = %err, "Subject resolution failed");
                None
            }
        }
    }

    /// Number of cached names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}
