//! Object Model - identity handles and shapes of introspected objects
//!
//! Everything the engine knows about a live object comes through these types.
//! Identity is carried by [`ObjectId`] alone: two objects that compare equal in
//! the inspected program are still two different ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Identity handle of one live object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Synthetic root of every heap graph
    pub const ROOT: ObjectId = ObjectId(u64::MAX);

    /// Placeholder standing for "no class loader" (bootstrap classes)
    pub const BOOTSTRAP_LOADER: ObjectId = ObjectId(u64::MAX - 1);

    /// True for ids the engine invents rather than the backend
    #[inline]
    pub fn is_synthetic(self) -> bool {
        self == Self::ROOT || self == Self::BOOTSTRAP_LOADER
    }

    /// Shape of a synthetic object, `None` for backend objects
    pub fn synthetic_info(self) -> Option<ObjectInfo> {
        match self {
            Self::ROOT => Some(ObjectInfo::new("<root>", ObjectKind::Synthetic)),
            Self::BOOTSTRAP_LOADER => {
                Some(ObjectInfo::new("<bootstrap-loader>", ObjectKind::ClassLoader))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::ROOT => write!(f, "<root>"),
            Self::BOOTSTRAP_LOADER => write!(f, "<bootstrap>"),
            ObjectId(raw) => write!(f, "@{:x}", raw),
        }
    }
}

/// Identity of a field descriptor, stable across enumerations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u64);

/// Runtime shape of an object, used by expanders to claim it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Plain object with instance fields
    Instance,
    /// Array whose element type is a reference type
    ReferenceArray,
    /// Array of primitives (never expanded)
    PrimitiveArray,
    /// Collection whose elements are enumerable
    Collection,
    /// Class-loader-like entity owning classes
    ClassLoader,
    /// Class entity owning static fields
    Class,
    /// Weak/soft reference holder
    WeakReference,
    /// Object invented by the engine (root, bootstrap placeholder)
    Synthetic,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Instance => "instance",
            ObjectKind::ReferenceArray => "reference_array",
            ObjectKind::PrimitiveArray => "primitive_array",
            ObjectKind::Collection => "collection",
            ObjectKind::ClassLoader => "class_loader",
            ObjectKind::Class => "class",
            ObjectKind::WeakReference => "weak_reference",
            ObjectKind::Synthetic => "synthetic",
        }
    }

    /// Arrays are the only structures assumed to be theoretically unbounded
    #[inline]
    pub fn is_reference_array(&self) -> bool {
        matches!(self, ObjectKind::ReferenceArray)
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the backend reports about one object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
    pub type_name: Arc<str>,
    pub kind: ObjectKind,
    /// Internal state of the engine itself; never traced
    pub do_not_trace: bool,
}

impl ObjectInfo {
    pub fn new(type_name: impl Into<Arc<str>>, kind: ObjectKind) -> Self {
        Self {
            type_name: type_name.into(),
            kind,
            do_not_trace: false,
        }
    }

    pub fn do_not_trace(mut self) -> Self {
        self.do_not_trace = true;
        self
    }
}

/// Descriptor of a (static or instance) field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: FieldId,
    pub name: Arc<str>,
    pub declaring_type: Arc<str>,
    /// Payload field of a weak/soft reference holder
    pub is_referent: bool,
}

impl FieldDescriptor {
    pub fn new(id: FieldId, declaring_type: impl Into<Arc<str>>, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
            declaring_type: declaring_type.into(),
            is_referent: false,
        }
    }

    pub fn referent(mut self) -> Self {
        self.is_referent = true;
        self
    }

    /// `DeclaringType#name`
    pub fn qualified_name(&self) -> String {
        format!("{}#{}", self.declaring_type, self.name)
    }
}

/// One enumerated field and its current value (`None` = null)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    pub field: FieldDescriptor,
    pub value: Option<ObjectId>,
}

impl FieldValue {
    pub fn new(field: FieldDescriptor, value: Option<ObjectId>) -> Self {
        Self { field, value }
    }
}
