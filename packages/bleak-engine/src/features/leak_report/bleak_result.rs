//! Aggregate result of one leak-detection run

use super::leak_info::LeakInfo;
use super::whitelist::Whitelist;
use crate::features::disposer_info::DisposerGrowth;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BleakResult {
    /// Actionable leaks; any entry fails the run
    pub leaks: Vec<LeakInfo>,
    /// Growth matching a known-issue rule; reported, never fatal
    pub known_issues: Vec<LeakInfo>,
    /// Number of candidates discarded by the whitelist
    pub whitelisted: usize,
    pub disposer_growth: Vec<DisposerGrowth>,
    pub iterations_run: usize,
    pub terminal_graph_nodes: usize,
}

impl BleakResult {
    /// Sort candidates: whitelisted ones are dropped first, then known issues
    /// are split off, the rest are real leaks
    pub fn partition(
        candidates: Vec<LeakInfo>,
        whitelist: &Whitelist,
        known_issues: &Whitelist,
        disposer_growth: Vec<DisposerGrowth>,
    ) -> Self {
        let mut result = BleakResult {
            disposer_growth,
            ..Default::default()
        };
        for candidate in candidates {
            if whitelist.matches(&candidate) {
                result.whitelisted += 1;
            } else if known_issues.matches(&candidate) {
                result.known_issues.push(candidate);
            } else {
                result.leaks.push(candidate);
            }
        }
        result
    }

    pub fn with_stats(mut self, iterations_run: usize, terminal_graph_nodes: usize) -> Self {
        self.iterations_run = iterations_run;
        self.terminal_graph_nodes = terminal_graph_nodes;
        self
    }

    /// No real leaks and no ownership growth
    pub fn success(&self) -> bool {
        self.leaks.is_empty() && self.disposer_growth.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl fmt::Display for BleakResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} leak root(s), {} known issue(s), {} whitelisted after {} iteration(s) ({} nodes in terminal graph)",
            self.leaks.len(),
            self.known_issues.len(),
            self.whitelisted,
            self.iterations_run,
            self.terminal_graph_nodes
        )?;
        if !self.leaks.is_empty() {
            writeln!(f, "Growing objects:")?;
            for leak in &self.leaks {
                writeln!(f, "{}", leak)?;
            }
        }
        if !self.disposer_growth.is_empty() {
            writeln!(f, "Growing ownership buckets:")?;
            for growth in &self.disposer_growth {
                writeln!(f, "  {}", growth)?;
            }
        }
        if !self.known_issues.is_empty() {
            writeln!(f, "Known issues:")?;
            for leak in &self.known_issues {
                writeln!(f, "{}", leak)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::disposer_info::DisposerKey;
    use crate::features::heap_graph::domain::Signature;
    use crate::features::leak_report::WhitelistRule;
    use crate::shared::models::ObjectId;
    use pretty_assertions::assert_eq;

    fn candidate(leak_type: &str) -> LeakInfo {
        LeakInfo::new(ObjectId(7), Signature::new(vec!["Holder#items".into()], leak_type), 4)
    }

    #[test]
    fn test_partition_precedence() {
        let rule = WhitelistRule::root_type("Shared[]");
        let whitelist = Whitelist::compile(&[rule.clone()], &[]).unwrap();
        let known = Whitelist::compile(&[rule, WhitelistRule::root_type("Known[]")], &[]).unwrap();

        let result = BleakResult::partition(
            vec![candidate("Shared[]"), candidate("Known[]"), candidate("Real[]")],
            &whitelist,
            &known,
            Vec::new(),
        );
        assert_eq!(result.whitelisted, 1);
        assert_eq!(result.known_issues.len(), 1);
        assert_eq!(result.leaks.len(), 1);
        assert_eq!(result.leaks[0].type_name, "Real[]");
        assert!(!result.success());
    }

    #[test]
    fn test_known_issues_alone_succeed() {
        let known = Whitelist::compile(&[WhitelistRule::root_type("Known[]")], &[]).unwrap();
        let result = BleakResult::partition(vec![candidate("Known[]")], &Whitelist::default(), &known, Vec::new());
        assert!(result.success());
    }

    #[test]
    fn test_disposer_growth_fails_run() {
        let growth = DisposerGrowth {
            key: DisposerKey {
                owner: ObjectId(1),
                owner_type: "Window".into(),
                child_type: "Listener".into(),
            },
            previous_count: 2,
            count: 3,
        };
        let result = BleakResult::partition(Vec::new(), &Whitelist::default(), &Whitelist::default(), vec![growth])
            .with_stats(3, 10);
        assert!(!result.success());
        let report = result.to_string();
        assert!(report.contains("Window@1 owns 3 x Listener (was 2)"));
        assert!(report.contains("after 3 iteration(s)"));
    }

    #[test]
    fn test_json_report() {
        let result = BleakResult::partition(
            vec![candidate("Real[]")],
            &Whitelist::default(),
            &Whitelist::default(),
            Vec::new(),
        );
        let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
        assert_eq!(json["leaks"][0]["type_name"], "Real[]");
        assert_eq!(json["leaks"][0]["signature"]["elements"][0], "Holder#items");
        assert_eq!(json["whitelisted"], 0);
    }
}
