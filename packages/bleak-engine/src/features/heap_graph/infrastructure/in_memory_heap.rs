//! In-memory heap - simulated introspection backend
//!
//! A small object heap that scenarios mutate directly. Used by the test suites
//! and by embedders that want to drive the engine without a real runtime.
//! Every mutator ignores ids it does not know, so a scenario may keep using an
//! id after freeing it.

use crate::features::heap_graph::ports::{
    BackendError, BackendResult, IntrospectionPort, OwnershipLink,
};
use crate::shared::models::{
    FieldDescriptor, FieldId, FieldValue, ObjectId, ObjectInfo, ObjectKind,
};
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Base size of an object header in bytes
const HEADER_SIZE: u64 = 16;
/// Size of one reference slot in bytes
const SLOT_SIZE: u64 = 8;
/// Declaring type of the instance fields of class objects
const METACLASS: &str = "Class";

#[derive(Debug, Clone)]
struct SimObject {
    info: ObjectInfo,
    fields: Vec<FieldValue>,
    statics: Vec<FieldValue>,
    elements: Vec<Option<ObjectId>>,
    /// Defining loader of a class object
    loader: Option<ObjectId>,
    /// Static initializer has run (classes only)
    initialized: bool,
    shallow_size: Option<u64>,
    failing: bool,
}

impl SimObject {
    fn new(info: ObjectInfo) -> Self {
        Self {
            info,
            fields: Vec::new(),
            statics: Vec::new(),
            elements: Vec::new(),
            loader: None,
            initialized: true,
            shallow_size: None,
            failing: false,
        }
    }

    fn size(&self) -> u64 {
        self.shallow_size.unwrap_or_else(|| {
            let slots = self.fields.len() + self.statics.len() + self.elements.len();
            HEADER_SIZE + SLOT_SIZE * slots as u64
        })
    }
}

#[derive(Debug, Default)]
struct HeapState {
    objects: FxHashMap<ObjectId, SimObject>,
    next_id: u64,
    /// Loaded classes in load order
    classes: Vec<ObjectId>,
    field_ids: FxHashMap<(Arc<str>, Arc<str>), FieldId>,
    ownership: Vec<OwnershipLink>,
}

impl HeapState {
    fn allocate(&mut self, object: SimObject) -> ObjectId {
        self.next_id += 1;
        let id = ObjectId(self.next_id);
        self.objects.insert(id, object);
        id
    }

    fn field_descriptor(&mut self, declaring_type: &Arc<str>, name: &str, referent: bool) -> FieldDescriptor {
        let next = FieldId(self.field_ids.len() as u64 + 1);
        let id = *self
            .field_ids
            .entry((Arc::clone(declaring_type), Arc::from(name)))
            .or_insert(next);
        let descriptor = FieldDescriptor::new(id, Arc::clone(declaring_type), name);
        if referent {
            descriptor.referent()
        } else {
            descriptor
        }
    }

    fn checked(&self, obj: ObjectId) -> BackendResult<&SimObject> {
        let object = self
            .objects
            .get(&obj)
            .ok_or(BackendError::UnknownObject(obj))?;
        if object.failing {
            return Err(BackendError::ConcurrentModification { object: obj });
        }
        Ok(object)
    }
}

fn put(slots: &mut Vec<FieldValue>, value: FieldValue) {
    match slots.iter_mut().find(|slot| slot.field.id == value.field.id) {
        Some(slot) => *slot = value,
        None => slots.push(value),
    }
}

/// Simulated heap implementing [`IntrospectionPort`]
#[derive(Debug, Default)]
pub struct InMemoryHeap {
    state: RwLock<HeapState>,
    pause_depth: AtomicUsize,
    pauses: AtomicUsize,
}

impl InMemoryHeap {
    pub fn new() -> Self {
        Self::default()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Allocation
    // ═══════════════════════════════════════════════════════════════════════

    pub fn new_object(&self, type_name: &str) -> ObjectId {
        self.alloc(ObjectInfo::new(type_name, ObjectKind::Instance))
    }

    pub fn new_array(&self, type_name: &str, elements: &[Option<ObjectId>]) -> ObjectId {
        self.alloc_sequence(ObjectInfo::new(type_name, ObjectKind::ReferenceArray), elements)
    }

    pub fn new_collection(&self, type_name: &str, elements: &[Option<ObjectId>]) -> ObjectId {
        self.alloc_sequence(ObjectInfo::new(type_name, ObjectKind::Collection), elements)
    }

    /// Primitive array of `len` one-byte slots
    pub fn new_primitive_array(&self, type_name: &str, len: usize) -> ObjectId {
        let mut object = SimObject::new(ObjectInfo::new(type_name, ObjectKind::PrimitiveArray));
        object.shallow_size = Some(HEADER_SIZE + len as u64);
        self.state.write().allocate(object)
    }

    pub fn new_class_loader(&self, type_name: &str) -> ObjectId {
        self.alloc(ObjectInfo::new(type_name, ObjectKind::ClassLoader))
    }

    /// Load a class with its static initializer already run
    pub fn define_class(&self, name: &str, loader: Option<ObjectId>) -> ObjectId {
        self.load_class(name, loader, true)
    }

    /// Load a class whose statics stay invisible until [`initialize_class`](Self::initialize_class)
    pub fn define_uninitialized_class(&self, name: &str, loader: Option<ObjectId>) -> ObjectId {
        self.load_class(name, loader, false)
    }

    pub fn initialize_class(&self, class: ObjectId) {
        if let Some(object) = self.state.write().objects.get_mut(&class) {
            object.initialized = true;
        }
    }

    pub fn unload_class(&self, class: ObjectId) {
        let mut state = self.state.write();
        state.classes.retain(|c| *c != class);
        state.objects.remove(&class);
    }

    /// Weak reference holder whose payload lives in its `referent` field
    pub fn new_weak_reference(&self, type_name: &str, referent: Option<ObjectId>) -> ObjectId {
        let holder = self.alloc(ObjectInfo::new(type_name, ObjectKind::WeakReference));
        self.set_field(holder, "referent", referent);
        holder
    }

    /// Engine-internal object that must never be traced
    pub fn new_internal_object(&self, type_name: &str) -> ObjectId {
        self.alloc(ObjectInfo::new(type_name, ObjectKind::Instance).do_not_trace())
    }

    /// Reclaim `obj`; references to it become dangling and are skipped
    pub fn free(&self, obj: ObjectId) {
        let mut state = self.state.write();
        state.objects.remove(&obj);
        state.classes.retain(|c| *c != obj);
        state.ownership.retain(|link| link.owner != obj && link.child != obj);
    }

    fn alloc(&self, info: ObjectInfo) -> ObjectId {
        self.state.write().allocate(SimObject::new(info))
    }

    fn alloc_sequence(&self, info: ObjectInfo, elements: &[Option<ObjectId>]) -> ObjectId {
        let mut object = SimObject::new(info);
        object.elements = elements.to_vec();
        self.state.write().allocate(object)
    }

    fn load_class(&self, name: &str, loader: Option<ObjectId>, initialized: bool) -> ObjectId {
        let mut object = SimObject::new(ObjectInfo::new(name, ObjectKind::Class));
        object.loader = loader;
        object.initialized = initialized;
        let mut state = self.state.write();
        let class = state.allocate(object);
        state.classes.push(class);
        class
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutation
    // ═══════════════════════════════════════════════════════════════════════

    /// Assign instance field `name`, declaring it on first use
    pub fn set_field(&self, obj: ObjectId, name: &str, value: Option<ObjectId>) {
        let mut state = self.state.write();
        let Some((type_name, kind)) = state
            .objects
            .get(&obj)
            .map(|o| (Arc::clone(&o.info.type_name), o.info.kind))
        else {
            return;
        };
        let referent = kind == ObjectKind::WeakReference && name == "referent";
        // instance fields of a class object are declared by the metaclass, not
        // by the class, so they never share an id with one of its statics
        let declaring_type = if kind == ObjectKind::Class {
            Arc::from(METACLASS)
        } else {
            type_name
        };
        let field = state.field_descriptor(&declaring_type, name, referent);
        if let Some(object) = state.objects.get_mut(&obj) {
            put(&mut object.fields, FieldValue::new(field, value));
        }
    }

    pub fn field(&self, obj: ObjectId, name: &str) -> Option<ObjectId> {
        let state = self.state.read();
        let object = state.objects.get(&obj)?;
        object
            .fields
            .iter()
            .find(|slot| &*slot.field.name == name)
            .and_then(|slot| slot.value)
    }

    pub fn set_static(&self, class: ObjectId, name: &str, value: Option<ObjectId>) {
        let mut state = self.state.write();
        let Some(type_name) = state.objects.get(&class).map(|o| Arc::clone(&o.info.type_name)) else {
            return;
        };
        let field = state.field_descriptor(&type_name, name, false);
        if let Some(object) = state.objects.get_mut(&class) {
            put(&mut object.statics, FieldValue::new(field, value));
        }
    }

    pub fn static_field(&self, class: ObjectId, name: &str) -> Option<ObjectId> {
        let state = self.state.read();
        let object = state.objects.get(&class)?;
        object
            .statics
            .iter()
            .find(|slot| &*slot.field.name == name)
            .and_then(|slot| slot.value)
    }

    pub fn push_element(&self, obj: ObjectId, element: Option<ObjectId>) {
        if let Some(object) = self.state.write().objects.get_mut(&obj) {
            object.elements.push(element);
        }
    }

    pub fn set_elements(&self, obj: ObjectId, elements: Vec<Option<ObjectId>>) {
        if let Some(object) = self.state.write().objects.get_mut(&obj) {
            object.elements = elements;
        }
    }

    pub fn elements(&self, obj: ObjectId) -> Vec<Option<ObjectId>> {
        self.state
            .read()
            .objects
            .get(&obj)
            .map(|o| o.elements.clone())
            .unwrap_or_default()
    }

    /// Register `child` as owned by `owner` in the ownership registry
    pub fn add_owned(&self, owner: ObjectId, child: ObjectId) {
        self.state.write().ownership.push(OwnershipLink { owner, child });
    }

    pub fn remove_owned(&self, owner: ObjectId, child: ObjectId) {
        let mut state = self.state.write();
        if let Some(pos) = state
            .ownership
            .iter()
            .position(|link| link.owner == owner && link.child == child)
        {
            state.ownership.remove(pos);
        }
    }

    pub fn set_shallow_size(&self, obj: ObjectId, bytes: u64) {
        if let Some(object) = self.state.write().objects.get_mut(&obj) {
            object.shallow_size = Some(bytes);
        }
    }

    /// Make every enumeration of `obj` fail as if it were modified mid-scan
    pub fn set_failing(&self, obj: ObjectId, failing: bool) {
        if let Some(object) = self.state.write().objects.get_mut(&obj) {
            object.failing = failing;
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Number of completed or active pauses
    pub fn pause_count(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        self.pause_depth.load(Ordering::SeqCst) > 0
    }

    pub fn object_count(&self) -> usize {
        self.state.read().objects.len()
    }
}

impl IntrospectionPort for InMemoryHeap {
    fn object_info(&self, obj: ObjectId) -> Option<ObjectInfo> {
        self.state.read().objects.get(&obj).map(|o| o.info.clone())
    }

    fn enumerate_fields(&self, obj: ObjectId) -> BackendResult<Vec<FieldValue>> {
        let state = self.state.read();
        Ok(state.checked(obj)?.fields.clone())
    }

    fn enumerate_static_fields(&self, class: ObjectId) -> BackendResult<Vec<FieldValue>> {
        let state = self.state.read();
        let object = state.checked(class)?;
        if !object.initialized {
            return Ok(Vec::new());
        }
        Ok(object.statics.clone())
    }

    fn enumerate_elements(&self, obj: ObjectId) -> BackendResult<Vec<Option<ObjectId>>> {
        let state = self.state.read();
        Ok(state.checked(obj)?.elements.clone())
    }

    fn enumerate_classes_of(&self, loader: Option<ObjectId>) -> BackendResult<Vec<ObjectId>> {
        let state = self.state.read();
        if let Some(loader) = loader {
            state.checked(loader)?;
        }
        Ok(state
            .classes
            .iter()
            .copied()
            .filter(|class| state.objects.get(class).map_or(false, |o| o.loader == loader))
            .collect())
    }

    fn enumerate_all_loaded_classes(&self) -> Vec<ObjectId> {
        self.state.read().classes.clone()
    }

    fn class_loader_of(&self, class: ObjectId) -> Option<ObjectId> {
        self.state.read().objects.get(&class).and_then(|o| o.loader)
    }

    fn pause_all_other_threads(&self) {
        self.pause_depth.fetch_add(1, Ordering::SeqCst);
        self.pauses.fetch_add(1, Ordering::SeqCst);
    }

    fn resume_all_other_threads(&self) {
        let _ = self
            .pause_depth
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |depth| depth.checked_sub(1));
    }

    fn approximate_shallow_size(&self, obj: ObjectId) -> u64 {
        self.state.read().objects.get(&obj).map_or(0, SimObject::size)
    }

    fn describe(&self, obj: ObjectId) -> String {
        let state = self.state.read();
        let Some(object) = state.objects.get(&obj) else {
            return obj.to_string();
        };
        let info = &object.info;
        match info.kind {
            ObjectKind::ReferenceArray | ObjectKind::Collection | ObjectKind::PrimitiveArray => {
                format!("{}[{}]{}", info.type_name, object.elements.len(), obj)
            }
            _ if object.fields.is_empty() => format!("{}{}", info.type_name, obj),
            _ => {
                let mut out = format!("{}{}{{", info.type_name, obj);
                for (i, slot) in object.fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    let _ = match slot.value {
                        Some(value) => write!(out, "{}={}", slot.field.name, value),
                        None => write!(out, "{}=null", slot.field.name),
                    };
                }
                out.push('}');
                out
            }
        }
    }

    fn ownership_tree(&self) -> Vec<OwnershipLink> {
        let state = self.state.read();
        let mut seen = FxHashSet::default();
        state
            .ownership
            .iter()
            .copied()
            .filter(|link| state.objects.contains_key(&link.owner) && seen.insert(*link))
            .collect()
    }
}
