// Source code generation from AST
// Reference printer for rewritten trees. It honours the node attributes set by
// rules: unchanged nodes are copied from the original text when it is
// available, everything else is regenerated.

use super::*;
use crate::tokens::{self, TokenStream};

/// Trait for types that can generate their source code representation
pub trait ToSource {
    fn to_source(&self) -> String;
}

impl ToSource for Node {
    fn to_source(&self) -> String {
        SourcePrinter::new().print(self)
    }
}

const INDENT: &str = "    ";

fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Printer with optional access to the original source of the tree
#[derive(Debug, Clone, Copy, Default)]
pub struct SourcePrinter<'a> {
    original: Option<&'a str>,
    tokens: Option<&'a TokenStream>,
}

impl<'a> SourcePrinter<'a> {
    /// Printer that regenerates everything
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer that reuses original text for nodes whose text is still valid
    /// and keeps trailing commas that were not explicitly suppressed
    pub fn with_original(source: &'a str, tokens: &'a TokenStream) -> Self {
        Self {
            original: Some(source),
            tokens: Some(tokens),
        }
    }

    pub fn print(&self, node: &Node) -> String {
        self.statement(node, 0)
    }

    fn verbatim(&self, span: Option<Span>, attrs: &NodeAttrs) -> Option<&'a str> {
        if !attrs.original_text_valid {
            return None;
        }
        let span = span?;
        self.original?.get(span.start..span.end)
    }

    fn statement(&self, node: &Node, depth: usize) -> String {
        if let Some(text) = self.verbatim(node.span, &node.attrs) {
            return text.to_string();
        }

        match &node.ast {
            Ast::Expression(expr) => format!("{};", self.expr(expr, depth)),
            Ast::Return(None) => "return;".to_string(),
            Ast::Return(Some(value)) => format!("return {};", self.expr(value, depth)),
            Ast::Function { name, params, body } => format!(
                "function {name}({})\n{}{}",
                self.params(params, depth),
                indent(depth),
                self.block(body, depth)
            ),
            Ast::ClassMethod {
                name,
                modifiers,
                params,
                body,
            } => {
                let mut head = modifiers.join(" ");
                if !head.is_empty() {
                    head.push(' ');
                }
                format!(
                    "{head}function {name}({})\n{}{}",
                    self.params(params, depth),
                    indent(depth),
                    self.block(body, depth)
                )
            }
            Ast::Class { name, members } => {
                format!("class {name}\n{}{}", indent(depth), self.block(members, depth))
            }
            Ast::InlineStatements(stmts) | Ast::Program(stmts) => {
                let separator = format!("\n{}", indent(depth));
                stmts
                    .iter()
                    .map(|stmt| self.statement(stmt, depth))
                    .collect::<Vec<_>>()
                    .join(&separator)
            }
            _ => self.expr(node, depth),
        }
    }

    fn block(&self, stmts: &[Node], depth: usize) -> String {
        let mut result = String::from("{\n");
        for stmt in stmts {
            result.push_str(&indent(depth + 1));
            result.push_str(&self.statement(stmt, depth + 1));
            result.push('\n');
        }
        result.push_str(&indent(depth));
        result.push('}');
        result
    }

    fn expr(&self, node: &Node, depth: usize) -> String {
        if let Some(text) = self.verbatim(node.span, &node.attrs) {
            return text.to_string();
        }

        match &node.ast {
            Ast::Null => "null".to_string(),
            Ast::Bool(value) => value.to_string(),
            Ast::Int(value) => value.to_string(),
            Ast::Str(value) => quote(value),
            Ast::Variable(name) => format!("${name}"),
            Ast::Name(name) => name.clone(),
            Ast::Assign { target, value } => {
                format!("{} = {}", self.expr(target, depth), self.expr(value, depth))
            }
            Ast::NotIdentical { left, right } => format!(
                "{} !== {}",
                self.operand(left, depth),
                self.operand(right, depth)
            ),
            Ast::Ternary {
                condition,
                if_true,
                if_false,
            } => format!(
                "{} ? {} : {}",
                self.operand(condition, depth),
                self.operand(if_true, depth),
                self.operand(if_false, depth)
            ),
            Ast::PropertyFetch { object, property } => {
                format!("{}->{property}", self.receiver(object, depth))
            }
            Ast::NullsafePropertyFetch { object, property } => {
                format!("{}?->{property}", self.receiver(object, depth))
            }
            Ast::MethodCall {
                object,
                method,
                args,
            } => format!(
                "{}->{method}({})",
                self.receiver(object, depth),
                self.args(args, depth)
            ),
            Ast::NullsafeMethodCall {
                object,
                method,
                args,
            } => format!(
                "{}?->{method}({})",
                self.receiver(object, depth),
                self.args(args, depth)
            ),
            Ast::StaticCall {
                class,
                method,
                args,
            } => format!(
                "{}::{method}({})",
                self.receiver(class, depth),
                self.args(args, depth)
            ),
            Ast::FuncCall { function, args } => format!(
                "{}({})",
                self.receiver(function, depth),
                self.args(args, depth)
            ),
            Ast::New { class, args } => {
                format!("new {}({})", self.expr(class, depth), self.args(args, depth))
            }
            Ast::CloneExpr { object } => format!("clone {}", self.operand(object, depth)),
            Ast::Closure {
                params,
                uses,
                body,
                is_static,
            } => {
                let mut result = String::new();
                if *is_static {
                    result.push_str("static ");
                }
                result.push_str(&format!("function ({})", self.params(params, depth)));
                if !uses.is_empty() {
                    let uses = self.list(uses, |used| {
                        format!("{}${}", if used.by_ref { "&" } else { "" }, used.name)
                    });
                    result.push_str(&format!(" use ({uses})"));
                }
                result.push(' ');
                result.push_str(&self.block(body, depth));
                result
            }
            Ast::Expression(_)
            | Ast::Return(_)
            | Ast::Function { .. }
            | Ast::Class { .. }
            | Ast::ClassMethod { .. }
            | Ast::InlineStatements(_)
            | Ast::Program(_) => self.statement(node, depth),
        }
    }

    /// Operand of a ternary, comparison or `clone`
    fn operand(&self, node: &Node, depth: usize) -> String {
        let text = self.expr(node, depth);
        match node.ast {
            Ast::Assign { .. } | Ast::Ternary { .. } => format!("({text})"),
            _ => text,
        }
    }

    /// Left-hand side of `->`, `::` or a call
    fn receiver(&self, node: &Node, depth: usize) -> String {
        let text = self.expr(node, depth);
        match node.ast {
            Ast::Assign { .. }
            | Ast::NotIdentical { .. }
            | Ast::Ternary { .. }
            | Ast::New { .. }
            | Ast::CloneExpr { .. }
            | Ast::Closure { .. } => format!("({text})"),
            _ => text,
        }
    }

    fn args(&self, args: &[Arg], depth: usize) -> String {
        self.list(args, |arg| {
            let mut result = String::new();
            if let Some(name) = &arg.name {
                result.push_str(&format!("{name}: "));
            }
            if arg.unpack {
                result.push_str("...");
            }
            if arg.by_ref {
                result.push('&');
            }
            result.push_str(&self.expr(&arg.value, depth));
            result
        })
    }

    fn params(&self, params: &[Param], depth: usize) -> String {
        self.list(params, |param| {
            let mut result = String::new();
            if let Some(type_hint) = &param.type_hint {
                result.push_str(&format!("{type_hint} "));
            }
            if param.by_ref {
                result.push('&');
            }
            if param.variadic {
                result.push_str("...");
            }
            result.push_str(&format!("${}", param.name));
            if let Some(default) = &param.default {
                result.push_str(&format!(" = {}", self.expr(default, depth)));
            }
            result
        })
    }

    /// Comma-separated list, keeping a trailing comma the original had unless
    /// the last element suppresses it
    fn list<T: ListElement>(&self, items: &[T], render: impl Fn(&T) -> String) -> String {
        let mut result = items
            .iter()
            .map(|item| match self.verbatim(item.span(), item.attrs()) {
                Some(text) => text.to_string(),
                None => render(item),
            })
            .collect::<Vec<_>>()
            .join(", ");

        if let Some(last) = items.last() {
            if !last.attrs().suppress_trailing_separator
                && tokens::is_followed_by_separator(self.tokens, last.span())
            {
                result.push(',');
            }
        }
        result
    }
}
