//! Leak report - whitelist rules, per-leak evidence and the run result

pub mod bleak_result;
pub mod leak_info;
pub mod whitelist;

pub use bleak_result::BleakResult;
pub use leak_info::LeakInfo;
pub use whitelist::{LeakPredicate, Whitelist, WhitelistRule};
