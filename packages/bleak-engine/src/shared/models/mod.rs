//! Shared value types describing objects as seen through the introspection port

pub mod object;

pub use object::{FieldDescriptor, FieldId, FieldValue, ObjectId, ObjectInfo, ObjectKind};
