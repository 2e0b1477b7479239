/*!
# Nullsafe To Ternary

Lowers `?->` method calls and property fetches into an assign-and-test
conditional that evaluates the receiver exactly once.
*/

use crate::ast::{Ast, Node, NodeKind};
use crate::engine::{CodeSample, DowngradeRule, Rewrite, RuleContext};

pub const DEFAULT_PREFIX: &str = "nullsafeVariable";

/// Rewrites `$a?->b()` into `($tmp = $a) ? $tmp->b() : null`
///
/// Chains are handled link by link: the dispatcher lowers the innermost `?->`
/// first, and the outer link then sees an ordinary expression as its receiver.
pub struct NullsafeToTernaryRule {
    prefix: String,
    strict_null_check: bool,
}

impl NullsafeToTernaryRule {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            strict_null_check: false,
        }
    }

    /// Prefix for the temporaries this rule introduces
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Test `($tmp = $a) !== null` instead of relying on truthiness
    pub fn strict_null_check(mut self, enabled: bool) -> Self {
        self.strict_null_check = enabled;
        self
    }
}

impl Default for NullsafeToTernaryRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DowngradeRule for NullsafeToTernaryRule {
    fn name(&self) -> &'static str {
        "NullsafeToTernary"
    }

    fn description(&self) -> &'static str {
        "Change nullsafe operator to ternary operator"
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::NullsafeMethodCall, NodeKind::NullsafePropertyFetch]
    }

    fn code_sample(&self) -> Option<CodeSample> {
        Some(CodeSample {
            before: "$dateAsString = $booking->getStartDate()?->asDateTimeString();",
            after: "$dateAsString = ($nullsafeVariable1 = $booking->getStartDate()) ? $nullsafeVariable1->asDateTimeString() : null;",
        })
    }

    fn refactor(&self, node: &mut Node, context: &mut RuleContext<'_>) -> Rewrite {
        if !matches!(
            node.ast,
            Ast::NullsafeMethodCall { .. } | Ast::NullsafePropertyFetch { .. }
        ) {
            return Rewrite::Unchanged;
        }

        let Some(variable) = context.fresh_variable(&self.prefix) else {
            return Rewrite::Unchanged;
        };

        let original = node.take();
        let (object, access) = match original.ast {
            Ast::NullsafeMethodCall {
                object,
                method,
                args,
            } => (object, Node::method_call(variable.clone(), method, args)),
            Ast::NullsafePropertyFetch { object, property } => {
                (object, Node::property_fetch(variable.clone(), property))
            }
            ast => {
                *node = Node { ast, ..original };
                return Rewrite::Unchanged;
            }
        };

        let assign = Node::assign(variable, *object);
        let condition = if self.strict_null_check {
            Node::not_identical(assign, context.null())
        } else {
            assign
        };

        Rewrite::Replace(Node::ternary(condition, access, context.null()))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ast::Arg;
    use crate::engine::{FileId, FreshNameAllocator};
    use pretty_assertions::assert_eq;

    fn refactor_in(file: Option<&FileId>, rule: &NullsafeToTernaryRule, mut node: Node) -> (Rewrite, Node) {
        let mut names = FreshNameAllocator::new();
        let reserved = HashSet::new();
        let mut context = RuleContext::new(file, None, &mut names, &reserved);
        let rewrite = rule.refactor(&mut node, &mut context);
        (rewrite, node)
    }

    #[test]
    fn test_method_call_shape() {
        let file = FileId::new("a.php");
        let call = Node::nullsafe_method_call(
            Node::variable("obj"),
            "method",
            vec![Arg::new(Node::variable("x"))],
        );

        let (rewrite, _) = refactor_in(Some(&file), &NullsafeToTernaryRule::new(), call);
        let expected = Node::ternary(
            Node::assign(Node::variable("nullsafeVariable1"), Node::variable("obj")),
            Node::method_call(
                Node::variable("nullsafeVariable1"),
                "method",
                vec![Arg::new(Node::variable("x"))],
            ),
            Node::null(),
        );
        assert_eq!(rewrite, Rewrite::Replace(expected));
    }

    #[test]
    fn test_property_fetch_shape() {
        let file = FileId::new("a.php");
        let fetch = Node::nullsafe_property_fetch(Node::variable("user"), "address");

        let (rewrite, _) = refactor_in(Some(&file), &NullsafeToTernaryRule::new(), fetch);
        let expected = Node::ternary(
            Node::assign(Node::variable("nullsafeVariable1"), Node::variable("user")),
            Node::property_fetch(Node::variable("nullsafeVariable1"), "address"),
            Node::null(),
        );
        assert_eq!(rewrite, Rewrite::Replace(expected));
    }

    #[test]
    fn test_strict_null_check() {
        let file = FileId::new("a.php");
        let rule = NullsafeToTernaryRule::new().with_prefix("tmp").strict_null_check(true);
        let fetch = Node::nullsafe_property_fetch(Node::variable("user"), "name");

        let (rewrite, _) = refactor_in(Some(&file), &rule, fetch);
        let expected = Node::ternary(
            Node::not_identical(
                Node::assign(Node::variable("tmp1"), Node::variable("user")),
                Node::null(),
            ),
            Node::property_fetch(Node::variable("tmp1"), "name"),
            Node::null(),
        );
        assert_eq!(rewrite, Rewrite::Replace(expected));
    }

    #[test]
    fn test_without_file_nothing_changes() {
        let fetch = Node::nullsafe_property_fetch(Node::variable("user"), "address");

        let (rewrite, node) = refactor_in(None, &NullsafeToTernaryRule::new(), fetch.clone());
        assert_eq!(rewrite, Rewrite::Unchanged);
        assert_eq!(node, fetch);
    }

    #[test]
    fn test_other_kinds_are_ignored() {
        let file = FileId::new("a.php");
        let fetch = Node::property_fetch(Node::variable("user"), "address");

        let (rewrite, node) = refactor_in(Some(&file), &NullsafeToTernaryRule::new(), fetch.clone());
        assert_eq!(rewrite, Rewrite::Unchanged);
        assert_eq!(node, fetch);
    }
}
