//! Evidence for one leak root of the terminal graph

use crate::errors::Result;
use crate::features::heap_graph::application::HeapGraph;
use crate::features::heap_graph::domain::{NodeId, Signature};
use crate::shared::models::ObjectId;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakInfo {
    pub object: ObjectId,
    pub type_name: String,
    /// Path to the leak root in the terminal graph
    pub signature: Signature,
    /// Path to its counterpart in the graph before, if it still resolves
    pub previous_signature: Option<Signature>,
    pub previous_degree: Option<usize>,
    pub degree: usize,
    /// Types of children without a counterpart in the previous graph
    pub added_children: BTreeMap<String, usize>,
    /// Approximate bytes only reachable through the added children
    pub retained_size: u64,
    /// Rendering of the leaking object, truncated
    pub description: String,
}

impl LeakInfo {
    pub fn new(object: ObjectId, signature: Signature, degree: usize) -> Self {
        Self {
            object,
            type_name: signature.leak_type.clone(),
            signature,
            previous_signature: None,
            previous_degree: None,
            degree,
            added_children: BTreeMap::new(),
            retained_size: 0,
            description: String::new(),
        }
    }

    /// Evidence for every leak root of `terminal`, compared with `previous`
    pub fn collect(
        terminal: &mut HeapGraph,
        previous: &HeapGraph,
        max_description_len: usize,
    ) -> Result<Vec<LeakInfo>> {
        let leak_roots = terminal.leak_roots().to_vec();
        leak_roots
            .into_iter()
            .map(|leak| Self::build(terminal, previous, leak, max_description_len))
            .collect()
    }

    fn build(
        terminal: &mut HeapGraph,
        previous: &HeapGraph,
        leak: NodeId,
        max_description_len: usize,
    ) -> Result<LeakInfo> {
        let node = terminal.node(leak);
        let object = node.object();
        let mut info = LeakInfo::new(object, terminal.arena().signature_of(leak), node.degree());

        let counterpart = previous.locate(terminal, leak);
        if let Some(old) = counterpart {
            info.previous_signature = Some(previous.arena().signature_of(old));
            info.previous_degree = Some(previous.node(old).degree());
        }

        let mut added = Vec::new();
        let mut seen = FxHashSet::default();
        for edge in terminal.node(leak).edges() {
            let existed = counterpart
                .map_or(false, |old| previous.child_for_label(old, &edge.label).is_some());
            if !existed && seen.insert(edge.end) {
                added.push(edge.end);
                let child_type = terminal.node(edge.end).type_name().to_string();
                *info.added_children.entry(child_type).or_insert(0) += 1;
            }
        }
        info.retained_size = terminal.retained_size(&added)?;
        info.description = truncate(&terminal.arena().backend().describe(object), max_description_len);
        Ok(info)
    }

    /// Number of children added since the previous snapshot
    pub fn added_count(&self) -> usize {
        self.added_children.values().sum()
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

impl fmt::Display for LeakInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.signature)?;
        if let Some(previous) = &self.previous_signature {
            if *previous != self.signature {
                writeln!(f, "    previously: {}", previous)?;
            }
        }
        match self.previous_degree {
            Some(before) => write!(f, "    degree {} -> {}", before, self.degree)?,
            None => write!(f, "    degree {}", self.degree)?,
        }
        if !self.added_children.is_empty() {
            let added: Vec<String> = self
                .added_children
                .iter()
                .map(|(ty, n)| format!("{} x {}", n, ty))
                .collect();
            write!(f, ", added {}", added.join(", "))?;
        }
        writeln!(f, ", retains ~{} bytes", self.retained_size)?;
        write!(f, "    object: {}", self.description)
    }
}
