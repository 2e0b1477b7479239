/*!
# Dispatcher - Rule Application Engine

Walks a file's tree depth-first and hands every node to the rules that claimed
its kind.
*/

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::ast::{Arg, Ast, Node, Param};
use crate::rules;
use crate::tokens::TokenStream;
use crate::{DownlevelConfig, Result};

use super::hygiene::FreshNameAllocator;
use super::rules::{DowngradeRule, RuleStats};
use super::walker;
use super::{FileId, Rewrite, RuleContext};

const DEFAULT_MAX_REVISITS: usize = 32;

/// Rule dispatcher for downgrade passes
///
/// Children are visited before their parent, so by the time a rule sees a node
/// everything below it has already been rewritten. A replacement produced by a
/// rule is walked again, which is how nested optional chains are lowered one
/// link at a time.
pub struct Dispatcher {
    rules: Vec<Box<dyn DowngradeRule>>,
    stats: HashMap<String, RuleStats>,
    names: FreshNameAllocator,
    max_revisits: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            stats: HashMap::new(),
            names: FreshNameAllocator::new(),
            max_revisits: DEFAULT_MAX_REVISITS,
        }
    }

    /// Dispatcher with the rules selected by `config`, sorted by priority
    pub fn from_config(config: &DownlevelConfig) -> Result<Self> {
        let mut dispatcher = Self::new().max_revisits(config.max_revisits);
        for rule in rules::rules_from_config(config)? {
            dispatcher.add_rule(rule);
        }
        dispatcher.sort_rules_by_priority();
        Ok(dispatcher)
    }

    /// Set how many times in a row a replacement may itself be replaced
    pub fn max_revisits(mut self, max: usize) -> Self {
        self.max_revisits = max;
        self
    }

    /// Register a rule
    pub fn add_rule(&mut self, rule: Box<dyn DowngradeRule>) {
        let rule_name = rule.name().to_string();
        self.stats
            .insert(rule_name.clone(), RuleStats::new(rule_name));
        self.rules.push(rule);
    }

    /// Sort rules by priority (higher priority first, stable otherwise)
    pub fn sort_rules_by_priority(&mut self) {
        self.rules.sort_by_key(|rule| std::cmp::Reverse(rule.priority()));
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn DowngradeRule> {
        self.rules.iter().map(|rule| &**rule)
    }

    /// Rewrite the tree of `file`
    pub fn run(&mut self, file: &FileId, root: Node, tokens: &TokenStream) -> Node {
        self.transform(Some(file), root, Some(tokens))
    }

    /// Rewrite a tree that belongs to no file
    ///
    /// Rules that need a file association to stay hygienic leave such trees
    /// alone.
    pub fn run_detached(&mut self, root: Node, tokens: Option<&TokenStream>) -> Node {
        self.transform(None, root, tokens)
    }

    fn transform(&mut self, file: Option<&FileId>, root: Node, tokens: Option<&TokenStream>) -> Node {
        let reserved = walker::variable_names(&root);
        let mut context = RuleContext::new(file, tokens, &mut self.names, &reserved);
        let mut pass = Pass {
            rules: &self.rules,
            stats: &mut self.stats,
            max_revisits: self.max_revisits,
        };
        pass.visit(root, &mut context, 0)
    }

    /// Get rule statistics
    pub fn stats(&self) -> &HashMap<String, RuleStats> {
        &self.stats
    }

    /// Clear statistics
    pub fn clear_stats(&mut self) {
        for stats in self.stats.values_mut() {
            *stats = RuleStats::new(stats.rule_name.clone());
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// A node whose printed form can no longer be copied from the original source
fn is_dirty(span_missing: bool, text_valid: bool) -> bool {
    span_missing || !text_valid
}

fn node_dirty(node: &Node) -> bool {
    is_dirty(node.span.is_none(), node.attrs.original_text_valid)
}

/// One traversal of one tree
struct Pass<'r> {
    rules: &'r [Box<dyn DowngradeRule>],
    stats: &'r mut HashMap<String, RuleStats>,
    max_revisits: usize,
}

impl Pass<'_> {
    fn visit(&mut self, mut node: Node, context: &mut RuleContext<'_>, revisits: usize) -> Node {
        if self.visit_children(&mut node, context, revisits) && node.span.is_some() {
            node.attrs.original_text_valid = false;
        }
        self.apply_rules(node, context, revisits)
    }

    fn apply_rules(&mut self, mut node: Node, context: &mut RuleContext<'_>, revisits: usize) -> Node {
        let kind = node.kind();
        let rules = self.rules;

        for rule in rules.iter().filter(|rule| rule.applies_to(kind)) {
            trace!(rule = rule.name(), %kind, "dispatching");
            let stats = self
                .stats
                .entry(rule.name().to_string())
                .or_insert_with(|| RuleStats::new(rule.name().to_string()));
            stats.applications += 1;

            match rule.refactor(&mut node, context) {
                Rewrite::Unchanged => {}
                Rewrite::Mutated => {
                    stats.mutations += 1;
                    debug!(rule = rule.name(), %kind, "mutated node attributes");
                }
                Rewrite::Replace(replacement) => {
                    stats.replacements += 1;
                    debug!(
                        rule = rule.name(),
                        from = %kind,
                        to = %replacement.kind(),
                        "replaced node"
                    );
                    if revisits >= self.max_revisits {
                        warn!(
                            rule = rule.name(),
                            limit = self.max_revisits,
                            "replacement chain too long, not revisiting"
                        );
                        return replacement;
                    }
                    return self.visit(replacement, context, revisits + 1);
                }
            }
        }

        node
    }

    /// Visit all children in place; true if any of them can no longer be
    /// printed from the original text
    fn visit_children(&mut self, node: &mut Node, context: &mut RuleContext<'_>, revisits: usize) -> bool {
        match &mut node.ast {
            Ast::Null | Ast::Bool(_) | Ast::Int(_) | Ast::Str(_) | Ast::Variable(_) | Ast::Name(_) => false,
            Ast::Assign { target, value } => {
                self.visit_slot(target, context, revisits) | self.visit_slot(value, context, revisits)
            }
            Ast::NotIdentical { left, right } => {
                self.visit_slot(left, context, revisits) | self.visit_slot(right, context, revisits)
            }
            Ast::Ternary {
                condition,
                if_true,
                if_false,
            } => {
                self.visit_slot(condition, context, revisits)
                    | self.visit_slot(if_true, context, revisits)
                    | self.visit_slot(if_false, context, revisits)
            }
            Ast::PropertyFetch { object, .. }
            | Ast::NullsafePropertyFetch { object, .. }
            | Ast::CloneExpr { object } => self.visit_slot(object, context, revisits),
            Ast::MethodCall { object, args, .. } | Ast::NullsafeMethodCall { object, args, .. } => {
                self.visit_slot(object, context, revisits) | self.visit_args(args, context, revisits)
            }
            Ast::StaticCall { class, args, .. } | Ast::New { class, args } => {
                self.visit_slot(class, context, revisits) | self.visit_args(args, context, revisits)
            }
            Ast::FuncCall { function, args } => {
                self.visit_slot(function, context, revisits) | self.visit_args(args, context, revisits)
            }
            Ast::Closure { params, body, .. }
            | Ast::Function { params, body, .. }
            | Ast::ClassMethod { params, body, .. } => {
                self.visit_params(params, context, revisits) | self.visit_statements(body, context, revisits)
            }
            Ast::Expression(expr) => self.visit_slot(expr, context, revisits),
            Ast::Return(value) => match value {
                Some(value) => self.visit_slot(value, context, revisits),
                None => false,
            },
            Ast::Class { members: stmts, .. } | Ast::InlineStatements(stmts) | Ast::Program(stmts) => {
                self.visit_statements(stmts, context, revisits)
            }
        }
    }

    fn visit_slot(&mut self, slot: &mut Node, context: &mut RuleContext<'_>, revisits: usize) -> bool {
        let child = slot.take();
        *slot = self.visit(child, context, revisits);
        node_dirty(slot)
    }

    fn visit_args(&mut self, args: &mut [Arg], context: &mut RuleContext<'_>, revisits: usize) -> bool {
        let mut dirty = false;
        for arg in args {
            if self.visit_slot(&mut arg.value, context, revisits) && arg.span.is_some() {
                arg.attrs.original_text_valid = false;
            }
            dirty |= is_dirty(arg.span.is_none(), arg.attrs.original_text_valid);
        }
        dirty
    }

    fn visit_params(&mut self, params: &mut [Param], context: &mut RuleContext<'_>, revisits: usize) -> bool {
        let mut dirty = false;
        for param in params {
            if let Some(default) = param.default.as_mut() {
                if self.visit_slot(default, context, revisits) && param.span.is_some() {
                    param.attrs.original_text_valid = false;
                }
            }
            dirty |= is_dirty(param.span.is_none(), param.attrs.original_text_valid);
        }
        dirty
    }

    /// Visit a statement list, splicing inline statement groups into it
    fn visit_statements(&mut self, stmts: &mut Vec<Node>, context: &mut RuleContext<'_>, revisits: usize) -> bool {
        let mut dirty = false;
        let mut visited = Vec::with_capacity(stmts.len());

        for stmt in stmts.drain(..) {
            match self.visit(stmt, context, revisits) {
                Node {
                    ast: Ast::InlineStatements(group),
                    ..
                } => {
                    dirty = true;
                    visited.extend(group);
                }
                stmt => {
                    dirty |= node_dirty(&stmt);
                    visited.push(stmt);
                }
            }
        }

        *stmts = visited;
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use crate::ast::NodeKind;
    use pretty_assertions::assert_eq;

    /// Renames every variable called `old`, once
    struct RenameOld;

    impl DowngradeRule for RenameOld {
        fn name(&self) -> &'static str {
            "RenameOld"
        }

        fn description(&self) -> &'static str {
            "Renames $old to $new"
        }

        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Variable]
        }

        fn refactor(&self, node: &mut Node, _context: &mut RuleContext<'_>) -> Rewrite {
            match &node.ast {
                Ast::Variable(name) if name == "old" => Rewrite::Replace(Node::variable("new")),
                _ => Rewrite::Unchanged,
            }
        }
    }

    /// Wraps every integer in another integer, forever
    struct Runaway;

    impl DowngradeRule for Runaway {
        fn name(&self) -> &'static str {
            "Runaway"
        }

        fn description(&self) -> &'static str {
            "Never settles"
        }

        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Int]
        }

        fn refactor(&self, node: &mut Node, _context: &mut RuleContext<'_>) -> Rewrite {
            match node.ast {
                Ast::Int(n) => Rewrite::Replace(Node::int(n + 1)),
                _ => Rewrite::Unchanged,
            }
        }
    }

    /// Records the kinds it sees, in order
    struct Recorder(Arc<Mutex<Vec<NodeKind>>>);

    impl DowngradeRule for Recorder {
        fn name(&self) -> &'static str {
            "Recorder"
        }

        fn description(&self) -> &'static str {
            "Observes dispatch order"
        }

        fn node_kinds(&self) -> &'static [NodeKind] {
            &[NodeKind::Variable, NodeKind::Assign, NodeKind::Expression, NodeKind::Program]
        }

        fn refactor(&self, node: &mut Node, _context: &mut RuleContext<'_>) -> Rewrite {
            if let Ok(mut seen) = self.0.lock() {
                seen.push(node.kind());
            }
            Rewrite::Unchanged
        }
    }

    fn assignment(target: &str, value: &str) -> Node {
        Node::program(vec![Node::expression(Node::assign(
            Node::variable(target),
            Node::variable(value),
        ))])
    }

    #[test]
    fn test_dispatch_only_to_claimed_kinds() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_rule(Box::new(RenameOld));

        let result = dispatcher.run(&FileId::new("a.php"), assignment("x", "old"), &TokenStream::default());
        assert_eq!(result, assignment("x", "new"));

        let stats = &dispatcher.stats()["RenameOld"];
        assert_eq!(stats.applications, 3);
        assert_eq!(stats.replacements, 1);
    }

    #[test]
    fn test_children_are_visited_before_parents() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_rule(Box::new(Recorder(seen.clone())));
        dispatcher.run_detached(assignment("x", "y"), None);

        let seen = seen.lock().map(|seen| seen.clone()).unwrap_or_default();
        assert_eq!(
            seen,
            vec![
                NodeKind::Variable,
                NodeKind::Variable,
                NodeKind::Assign,
                NodeKind::Expression,
                NodeKind::Program,
            ]
        );
    }

    #[test]
    fn test_runaway_rule_is_bounded() {
        let mut dispatcher = Dispatcher::new().max_revisits(5);
        dispatcher.add_rule(Box::new(Runaway));

        let result = dispatcher.run_detached(Node::int(0), None);
        // Initial replacement plus five revisits, each replacing once more
        assert_eq!(result, Node::int(6));
        assert_eq!(dispatcher.stats()["Runaway"].replacements, 6);
    }

    #[test]
    fn test_inline_statements_are_spliced() {
        struct Split;
        impl DowngradeRule for Split {
            fn name(&self) -> &'static str {
                "Split"
            }
            fn description(&self) -> &'static str {
                "Duplicates return statements"
            }
            fn node_kinds(&self) -> &'static [NodeKind] {
                &[NodeKind::Return]
            }
            fn refactor(&self, node: &mut Node, _context: &mut RuleContext<'_>) -> Rewrite {
                match &node.ast {
                    Ast::Return(Some(value)) if matches!(value.ast, Ast::Int(_)) => {
                        let first = Node::expression(Node::variable("before"));
                        Rewrite::Replace(Node::inline_statements(vec![
                            first,
                            Node::new(Ast::Return(None)),
                        ]))
                    }
                    _ => Rewrite::Unchanged,
                }
            }
        }

        let mut dispatcher = Dispatcher::new();
        dispatcher.add_rule(Box::new(Split));
        let tree = Node::program(vec![Node::return_value(Node::int(1)), Node::expression(Node::variable("after"))]);

        let result = dispatcher.run_detached(tree, None);
        assert_eq!(
            result,
            Node::program(vec![
                Node::expression(Node::variable("before")),
                Node::new(Ast::Return(None)),
                Node::expression(Node::variable("after")),
            ])
        );
    }

    #[test]
    fn test_rewrites_invalidate_ancestor_text() {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_rule(Box::new(RenameOld));

        let tree = Node::program(vec![
            Node::expression(Node::variable("keep").with_span(0, 5)).with_span(0, 6),
            Node::expression(Node::variable("old").with_span(7, 11)).with_span(7, 12),
        ])
        .with_span(0, 12);

        let result = dispatcher.run(&FileId::new("a.php"), tree, &TokenStream::default());
        let Ast::Program(stmts) = &result.ast else {
            panic!("expected program, got {result:?}");
        };
        assert!(stmts[0].attrs.original_text_valid);
        assert!(!stmts[1].attrs.original_text_valid);
        assert!(!result.attrs.original_text_valid);
    }
}
