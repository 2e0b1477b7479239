/*!
# Instance Method Call

Member access directly on `new Foo()` or `clone $x` needs a named receiver in
older grammars. The receiver is hoisted into a temporary assigned by a
statement of its own, placed right before the statement that used it.
*/

use crate::ast::{Arg, Ast, Node, NodeKind};
use crate::engine::{CodeSample, DowngradeRule, Rewrite, RuleContext};

pub const DEFAULT_PREFIX: &str = "object";

/// Rewrites `return (clone $this)->getName();` into
/// `$object1 = clone $this; return $object1->getName();`
pub struct InstanceMethodCallRule {
    prefix: String,
}

impl InstanceMethodCallRule {
    pub fn new() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }
}

impl Default for InstanceMethodCallRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DowngradeRule for InstanceMethodCallRule {
    fn name(&self) -> &'static str {
        "InstanceMethodCall"
    }

    fn description(&self) -> &'static str {
        "Hoist new/clone receivers of member access into a temporary variable"
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[NodeKind::Expression, NodeKind::Return]
    }

    fn code_sample(&self) -> Option<CodeSample> {
        Some(CodeSample {
            before: "return (clone $this)->getName();",
            after: "$object1 = clone $this;\nreturn $object1->getName();",
        })
    }

    fn refactor(&self, node: &mut Node, context: &mut RuleContext<'_>) -> Rewrite {
        if context.file().is_none() {
            return Rewrite::Unchanged;
        }
        let expr = match &mut node.ast {
            Ast::Expression(expr) | Ast::Return(Some(expr)) => expr.as_mut(),
            _ => return Rewrite::Unchanged,
        };

        let Some(receiver) = instantiated_receiver(expr) else {
            return Rewrite::Unchanged;
        };
        let Some(variable) = context.fresh_variable(&self.prefix) else {
            return Rewrite::Unchanged;
        };

        let instance = std::mem::replace(receiver, variable.clone());
        let hoisted = Node::expression(Node::assign(variable, instance));

        let mut statement = node.take();
        statement.attrs.original_text_valid = false;
        Rewrite::Replace(Node::inline_statements(vec![hoisted, statement]))
    }
}

fn is_instantiation(node: &Node) -> bool {
    matches!(node.ast, Ast::New { .. } | Ast::CloneExpr { .. })
}

/// First `new`/`clone` used directly as the receiver of a member access
///
/// Only subexpressions that are evaluated unconditionally are searched, so
/// ternary branches, nullsafe arguments and closure bodies are skipped. Every
/// node and argument on the path down to the receiver loses its original text,
/// since the receiver is about to be swapped for a temporary.
fn instantiated_receiver(node: &mut Node) -> Option<&mut Node> {
    let Node { ast, attrs, .. } = node;
    let found = match ast {
        Ast::MethodCall { object, args, .. } => {
            if is_instantiation(object) {
                Some(object.as_mut())
            } else if let Some(found) = instantiated_receiver(object) {
                Some(found)
            } else {
                receiver_in_args(args)
            }
        }
        Ast::PropertyFetch { object, .. } => {
            if is_instantiation(object) {
                Some(object.as_mut())
            } else {
                instantiated_receiver(object)
            }
        }
        Ast::NullsafeMethodCall { object, .. }
        | Ast::NullsafePropertyFetch { object, .. }
        | Ast::CloneExpr { object } => instantiated_receiver(object),
        Ast::StaticCall { class, args, .. } | Ast::New { class, args } => {
            match instantiated_receiver(class) {
                Some(found) => Some(found),
                None => receiver_in_args(args),
            }
        }
        Ast::FuncCall { function, args } => match instantiated_receiver(function) {
            Some(found) => Some(found),
            None => receiver_in_args(args),
        },
        Ast::Assign { target, value } => match instantiated_receiver(target) {
            Some(found) => Some(found),
            None => instantiated_receiver(value),
        },
        Ast::NotIdentical { left, right } => match instantiated_receiver(left) {
            Some(found) => Some(found),
            None => instantiated_receiver(right),
        },
        Ast::Ternary { condition, .. } => instantiated_receiver(condition),
        _ => None,
    };

    if found.is_some() {
        attrs.original_text_valid = false;
    }
    found
}

fn receiver_in_args(args: &mut [Arg]) -> Option<&mut Node> {
    args.iter_mut().find_map(|arg| {
        let found = instantiated_receiver(&mut arg.value)?;
        arg.attrs.original_text_valid = false;
        Some(found)
    })
}
