/*!
# Downgrade Rules

Core trait and bookkeeping for rewrite rules.
*/

use crate::ast::{Node, NodeKind};

use super::{Rewrite, RuleContext};

/// Core trait for downgrade rules
///
/// A rule claims a fixed set of node kinds. The dispatcher calls `refactor`
/// only for nodes of those kinds, one node at a time, and a rule may touch
/// nothing but the node it was handed.
pub trait DowngradeRule: Send + Sync {
    /// Human-readable name for this rule
    fn name(&self) -> &'static str;

    /// Short description of what this rule does
    fn description(&self) -> &'static str;

    /// Priority for rule ordering (higher priority runs first)
    fn priority(&self) -> u32 {
        100
    }

    /// Node kinds this rule wants to see
    fn node_kinds(&self) -> &'static [NodeKind];

    /// Before/after source illustrating the rewrite
    fn code_sample(&self) -> Option<CodeSample> {
        None
    }

    fn applies_to(&self, kind: NodeKind) -> bool {
        self.node_kinds().contains(&kind)
    }

    /// Rewrite `node`, mutate its attributes, or leave it alone
    fn refactor(&self, node: &mut Node, context: &mut RuleContext<'_>) -> Rewrite;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSample {
    pub before: &'static str,
    pub after: &'static str,
}

/// Rule execution statistics
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleStats {
    pub rule_name: String,
    pub applications: u64,
    pub mutations: u64,
    pub replacements: u64,
}

impl RuleStats {
    pub fn new(rule_name: String) -> Self {
        Self {
            rule_name,
            applications: 0,
            mutations: 0,
            replacements: 0,
        }
    }

    pub fn rewrites(&self) -> u64 {
        self.mutations + self.replacements
    }

    pub fn rewrite_rate(&self) -> f64 {
        if self.applications == 0 {
            0.0
        } else {
            (self.rewrites() as f64) / (self.applications as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_rate() {
        let mut stats = RuleStats::new("Example".to_string());
        assert_eq!(stats.rewrite_rate(), 0.0);

        stats.applications = 4;
        stats.mutations = 1;
        stats.replacements = 1;
        assert_eq!(stats.rewrites(), 2);
        assert_eq!(stats.rewrite_rate(), 0.5);
    }
}
