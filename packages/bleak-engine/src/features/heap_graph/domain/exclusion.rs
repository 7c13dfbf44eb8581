//! Exclusion policy - which children are not worth a node
//!
//! Excluded by default:
//! - objects tagged do-not-trace (the engine's own bookkeeping would otherwise
//!   grow every iteration)
//! - primitive arrays
//! - the payload of weak/soft reference holders, unless following is enabled

use crate::shared::models::{FieldDescriptor, ObjectInfo, ObjectKind};
use std::fmt;
use std::sync::Arc;

/// Extra caller-supplied exclusion: `true` means skip the child
pub type ExclusionPredicate = Arc<dyn Fn(&ObjectInfo) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct ExclusionPolicy {
    follow_weak_references: bool,
    predicate: Option<ExclusionPredicate>,
}

impl ExclusionPolicy {
    pub fn new(follow_weak_references: bool) -> Self {
        Self {
            follow_weak_references,
            predicate: None,
        }
    }

    pub fn with_predicate(mut self, predicate: Option<ExclusionPredicate>) -> Self {
        self.predicate = predicate;
        self
    }

    #[inline]
    pub fn follows_weak_references(&self) -> bool {
        self.follow_weak_references
    }

    /// Decide whether `child`, reached through `field` (if any), is skipped
    pub fn excludes(&self, field: Option<&FieldDescriptor>, child: &ObjectInfo) -> bool {
        if child.do_not_trace || child.kind == ObjectKind::PrimitiveArray {
            return true;
        }
        if !self.follow_weak_references && field.map_or(false, |f| f.is_referent) {
            return true;
        }
        self.predicate.as_ref().map_or(false, |p| p(child))
    }
}

impl fmt::Debug for ExclusionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusionPolicy")
            .field("follow_weak_references", &self.follow_weak_references)
            .field("has_predicate", &self.predicate.is_some())
            .finish()
    }
}
