//! Edge labels
//!
//! A label is the identity-bearing discriminator of an edge. It is what lets an
//! edge observed in one snapshot be re-found in another:
//!
//! - `Field` survives reassignment: the field does not move even when its value does.
//! - `ObjectIdentity` survives reordering: the child is found wherever it now sits.
//! - `RootLoopback` is the self edge of a root.

use crate::shared::models::{FieldId, ObjectId};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    /// Root's self edge
    RootLoopback,
    /// Child identified by being exactly this object
    ObjectIdentity(ObjectId),
    /// Child identified by the field of the parent that holds it
    Field(FieldId),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::RootLoopback => write!(f, "<loopback>"),
            Label::ObjectIdentity(obj) => write!(f, "={}", obj),
            Label::Field(field) => write!(f, "field#{}", field.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_identity_label_equality_is_by_object() {
        assert_eq!(Label::ObjectIdentity(ObjectId(1)), Label::ObjectIdentity(ObjectId(1)));
        assert_ne!(Label::ObjectIdentity(ObjectId(1)), Label::ObjectIdentity(ObjectId(2)));
    }

    #[test]
    fn test_field_and_identity_never_collide() {
        let labels: HashSet<Label> = [
            Label::Field(FieldId(3)),
            Label::ObjectIdentity(ObjectId(3)),
            Label::RootLoopback,
        ]
        .into_iter()
        .collect();
        assert_eq!(labels.len(), 3);
    }
}
