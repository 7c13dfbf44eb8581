//! Heap Graph Infrastructure - built-in expanders and the simulated backend

pub(crate) mod anomaly;
pub mod array_expander;
pub mod chooser;
pub mod class_loader_expander;
pub mod class_statics_expander;
pub mod default_expander;
pub mod identity_index;
pub mod in_memory_heap;
pub mod root_expander;

pub use array_expander::ReferenceArrayExpander;
pub use chooser::ExpanderChooser;
pub use class_loader_expander::ClassLoaderExpander;
pub use class_statics_expander::ClassStaticsExpander;
pub use default_expander::DefaultExpander;
pub use identity_index::IdentityIndex;
pub use in_memory_heap::InMemoryHeap;
pub use root_expander::RootExpander;
