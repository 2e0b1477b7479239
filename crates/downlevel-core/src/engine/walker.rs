/*!
# AST Walking Utilities

Read-only traversal helpers.
*/

use std::collections::HashSet;

use crate::ast::{Ast, Node};

/// Call `visit` for every direct child node, in evaluation order
///
/// Argument values and parameter defaults count as children; list elements
/// themselves are not nodes.
pub fn for_each_child<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    match &node.ast {
        Ast::Null | Ast::Bool(_) | Ast::Int(_) | Ast::Str(_) | Ast::Variable(_) | Ast::Name(_) => {}
        Ast::Assign { target, value } => {
            visit(target);
            visit(value);
        }
        Ast::NotIdentical { left, right } => {
            visit(left);
            visit(right);
        }
        Ast::Ternary {
            condition,
            if_true,
            if_false,
        } => {
            visit(condition);
            visit(if_true);
            visit(if_false);
        }
        Ast::PropertyFetch { object, .. }
        | Ast::NullsafePropertyFetch { object, .. }
        | Ast::CloneExpr { object } => visit(object),
        Ast::MethodCall { object, args, .. } | Ast::NullsafeMethodCall { object, args, .. } => {
            visit(object);
            args.iter().for_each(|arg| visit(&arg.value));
        }
        Ast::StaticCall { class, args, .. } | Ast::New { class, args } => {
            visit(class);
            args.iter().for_each(|arg| visit(&arg.value));
        }
        Ast::FuncCall { function, args } => {
            visit(function);
            args.iter().for_each(|arg| visit(&arg.value));
        }
        Ast::Closure { params, body, .. }
        | Ast::Function { params, body, .. }
        | Ast::ClassMethod { params, body, .. } => {
            params
                .iter()
                .filter_map(|param| param.default.as_ref())
                .for_each(|default| visit(default));
            body.iter().for_each(|stmt| visit(stmt));
        }
        Ast::Expression(expr) => visit(expr),
        Ast::Return(value) => {
            if let Some(value) = value {
                visit(value);
            }
        }
        Ast::Class { members: stmts, .. } | Ast::InlineStatements(stmts) | Ast::Program(stmts) => {
            stmts.iter().for_each(|stmt| visit(stmt));
        }
    }
}

/// Pre-order walk over `node` and all its descendants
pub fn walk<'a>(node: &'a Node, visit: &mut impl FnMut(&'a Node)) {
    visit(node);
    for_each_child(node, &mut |child| walk(child, visit));
}

/// Every variable name bound or referenced anywhere in the tree, including
/// parameters and closure captures
pub fn variable_names(node: &Node) -> HashSet<String> {
    let mut names = HashSet::new();
    walk(node, &mut |candidate| match &candidate.ast {
        Ast::Variable(name) => {
            names.insert(name.clone());
        }
        Ast::Closure { params, uses, .. } => {
            names.extend(params.iter().map(|param| param.name.clone()));
            names.extend(uses.iter().map(|used| used.name.clone()));
        }
        Ast::Function { params, .. } | Ast::ClassMethod { params, .. } => {
            names.extend(params.iter().map(|param| param.name.clone()));
        }
        _ => {}
    });
    names
}
