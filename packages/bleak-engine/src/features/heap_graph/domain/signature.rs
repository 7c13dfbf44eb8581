//! Leak signatures
//!
//! A signature is the human-readable form of a root→node path: one element per
//! edge (`StartType#what`) plus the type of the final node. Whitelist rules
//! match against it.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Signature {
    pub elements: Vec<String>,
    pub leak_type: String,
}

impl Signature {
    pub fn new(elements: Vec<String>, leak_type: impl Into<String>) -> Self {
        Self {
            elements,
            leak_type: leak_type.into(),
        }
    }

    /// Edge elements followed by the final type
    pub fn parts(&self) -> impl Iterator<Item = &str> + '_ {
        self.elements
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.leak_type.as_str()))
    }

    /// True if `pattern` occurs as a contiguous run of parts (`*` matches any part)
    pub fn contains_run(&self, pattern: &[String]) -> bool {
        if pattern.is_empty() {
            return true;
        }
        let parts: Vec<&str> = self.parts().collect();
        parts
            .windows(pattern.len())
            .any(|window| window_matches(window, pattern))
    }

    /// True if the last parts match `pattern` (`*` matches any part)
    pub fn ends_with(&self, pattern: &[String]) -> bool {
        let parts: Vec<&str> = self.parts().collect();
        if pattern.len() > parts.len() {
            return false;
        }
        window_matches(&parts[parts.len() - pattern.len()..], pattern)
    }
}

fn window_matches(window: &[&str], pattern: &[String]) -> bool {
    window
        .iter()
        .zip(pattern)
        .all(|(part, expected)| expected == "*" || part == expected)
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{} -> ", element)?;
        }
        f.write_str(&self.leak_type)
    }
}
