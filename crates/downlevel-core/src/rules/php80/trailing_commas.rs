/*!
# Trailing Commas In Param/Use Lists

Removes the trailing comma from parameter lists, closure `use` lists and call
argument lists. The tree does not record the comma, so the rule consults the
original tokens and signals the printer through node attributes.
*/

use crate::ast::{Ast, ListElement, Node, NodeKind};
use crate::engine::{CodeSample, DowngradeRule, Rewrite, RuleContext};

pub struct TrailingCommasInParamUseRule;

impl TrailingCommasInParamUseRule {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TrailingCommasInParamUseRule {
    fn default() -> Self {
        Self::new()
    }
}

impl DowngradeRule for TrailingCommasInParamUseRule {
    fn name(&self) -> &'static str {
        "TrailingCommasInParamUse"
    }

    fn description(&self) -> &'static str {
        "Remove trailing commas in param or use list"
    }

    fn node_kinds(&self) -> &'static [NodeKind] {
        &[
            NodeKind::ClassMethod,
            NodeKind::Function,
            NodeKind::Closure,
            NodeKind::StaticCall,
            NodeKind::FuncCall,
            NodeKind::MethodCall,
            NodeKind::New,
        ]
    }

    fn code_sample(&self) -> Option<CodeSample> {
        Some(CodeSample {
            before: "function inFunction(string $value1, string $value2,)\n{\n    return function () use ($value1, $value2,) {\n    };\n}",
            after: "function inFunction(string $value1, string $value2)\n{\n    return function () use ($value1, $value2) {\n    };\n}",
        })
    }

    fn refactor(&self, node: &mut Node, context: &mut RuleContext<'_>) -> Rewrite {
        let cleaned = match &mut node.ast {
            Ast::FuncCall { args, .. }
            | Ast::MethodCall { args, .. }
            | Ast::StaticCall { args, .. }
            | Ast::New { args, .. } => clean_trailing_comma(args, context),
            // Captures and parameters carry their own commas
            Ast::Closure { params, uses, .. } => {
                let uses_cleaned = clean_trailing_comma(uses, context);
                let params_cleaned = clean_trailing_comma(params, context);
                uses_cleaned || params_cleaned
            }
            Ast::Function { params, .. } | Ast::ClassMethod { params, .. } => {
                clean_trailing_comma(params, context)
            }
            _ => false,
        };

        if !cleaned {
            return Rewrite::Unchanged;
        }

        node.attrs.original_text_valid = false;
        Rewrite::Mutated
    }
}

/// Mark the last element of `list` if the source has a comma after it
fn clean_trailing_comma<T: ListElement>(list: &mut [T], context: &RuleContext<'_>) -> bool {
    let Some(last) = list.last_mut() else {
        return false;
    };

    if last.attrs().suppress_trailing_separator || !context.is_followed_by_separator(last.span()) {
        return false;
    }

    last.attrs_mut().suppress_trailing_separator = true;
    true
}
