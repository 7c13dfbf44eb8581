//! Expander chooser - ordered registry of the expanders of one graph
//!
//! Order is fixed: root, class loader, class statics, reference array, then
//! caller-supplied expanders in registration order, then the default field
//! expander. The first expander whose `can_expand` accepts an object claims it.

use super::array_expander::ReferenceArrayExpander;
use super::class_loader_expander::ClassLoaderExpander;
use super::class_statics_expander::ClassStaticsExpander;
use super::default_expander::DefaultExpander;
use super::root_expander::RootExpander;
use crate::errors::{BleakError, Result};
use crate::features::heap_graph::ports::{Expander, ExpanderFactory};
use crate::shared::models::{ObjectId, ObjectInfo};
use std::fmt;
use std::sync::Arc;

pub struct ExpanderChooser {
    expanders: Vec<Box<dyn Expander>>,
}

impl ExpanderChooser {
    /// Built-in chain with fresh custom expanders spliced in before the default
    pub fn new(index_threshold: usize, custom: &[Arc<dyn ExpanderFactory>]) -> Self {
        let mut expanders: Vec<Box<dyn Expander>> = vec![
            Box::new(RootExpander::new()),
            Box::new(ClassLoaderExpander::new(index_threshold)),
            Box::new(ClassStaticsExpander::new()),
            Box::new(ReferenceArrayExpander::new(index_threshold)),
        ];
        expanders.extend(custom.iter().map(|factory| factory.create()));
        expanders.push(Box::new(DefaultExpander::new()));
        Self { expanders }
    }

    /// Exactly the given chain, with no fallback appended
    pub fn from_expanders(expanders: Vec<Box<dyn Expander>>) -> Self {
        Self { expanders }
    }

    /// Index of the first expander claiming `object`
    pub fn choose(&self, object: ObjectId, info: &ObjectInfo) -> Result<usize> {
        self.expanders
            .iter()
            .position(|expander| expander.can_expand(object, info))
            .ok_or_else(|| BleakError::NoMatchingExpander {
                object,
                type_name: info.type_name.to_string(),
            })
    }

    #[inline]
    pub fn get(&self, index: usize) -> &dyn Expander {
        self.expanders[index].as_ref()
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut dyn Expander {
        self.expanders[index].as_mut()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.expanders.iter().map(|e| e.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.expanders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanders.is_empty()
    }
}

impl fmt::Debug for ExpanderChooser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExpanderChooser")
            .field("expanders", &self.names())
            .finish()
    }
}
