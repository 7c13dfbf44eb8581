//! Pipeline - orchestration of repeated scenario runs

pub mod driver;

pub use driver::{run_with_bleak, LeakDetector};
