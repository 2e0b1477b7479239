// Unified AST for downgrade passes
// Trees arrive from an external parser; every node remembers the byte span it
// was parsed from so rules can correlate it with the original token stream.

pub mod source_gen;
pub use source_gen::{SourcePrinter, ToSource};


use std::fmt;

use serde::{Deserialize, Serialize};

/// Byte range of a node in its source file, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Formatting flags read by the printer
///
/// These are the only channel between rewrite rules and whatever prints the
/// tree back to text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeAttrs {
    /// The printer may reuse the node's original source text verbatim
    pub original_text_valid: bool,
    /// The printer must not emit a separator after this list element
    pub suppress_trailing_separator: bool,
}

impl Default for NodeAttrs {
    fn default() -> Self {
        Self {
            original_text_valid: true,
            suppress_trailing_separator: false,
        }
    }
}

/// A single AST node: its syntax, where it came from, and printer flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub ast: Ast,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub attrs: NodeAttrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ast {
    // Literals
    Null,
    Bool(bool),
    Int(i64),
    Str(String),

    // Names
    Variable(String), // $name
    Name(String),     // bare identifier: function, class or constant name

    // Expressions
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    NotIdentical {
        left: Box<Node>,
        right: Box<Node>,
    },
    Ternary {
        condition: Box<Node>,
        if_true: Box<Node>,
        if_false: Box<Node>,
    },
    PropertyFetch {
        object: Box<Node>,
        property: String,
    },
    NullsafePropertyFetch {
        object: Box<Node>,
        property: String,
    },
    MethodCall {
        object: Box<Node>,
        method: String,
        args: Vec<Arg>,
    },
    NullsafeMethodCall {
        object: Box<Node>,
        method: String,
        args: Vec<Arg>,
    },
    StaticCall {
        class: Box<Node>,
        method: String,
        args: Vec<Arg>,
    },
    FuncCall {
        function: Box<Node>,
        args: Vec<Arg>,
    },
    New {
        class: Box<Node>,
        args: Vec<Arg>,
    },
    CloneExpr {
        object: Box<Node>,
    },
    Closure {
        params: Vec<Param>,
        uses: Vec<ClosureUse>,
        body: Vec<Node>,
        is_static: bool,
    },

    // Statements
    Expression(Box<Node>),
    Return(Option<Box<Node>>),
    Function {
        name: String,
        params: Vec<Param>,
        body: Vec<Node>,
    },
    Class {
        name: String,
        members: Vec<Node>,
    },
    ClassMethod {
        name: String,
        modifiers: Vec<String>,
        params: Vec<Param>,
        body: Vec<Node>,
    },
    /// Statements produced by a rewrite that stand in for a single statement;
    /// spliced into the enclosing statement list during traversal
    InlineStatements(Vec<Node>),
    Program(Vec<Node>),
}

/// Payload-free tag of an [`Ast`] variant, used for rule dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Null,
    Bool,
    Int,
    Str,
    Variable,
    Name,
    Assign,
    NotIdentical,
    Ternary,
    PropertyFetch,
    NullsafePropertyFetch,
    MethodCall,
    NullsafeMethodCall,
    StaticCall,
    FuncCall,
    New,
    CloneExpr,
    Closure,
    Expression,
    Return,
    Function,
    Class,
    ClassMethod,
    InlineStatements,
    Program,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl Ast {
    pub fn kind(&self) -> NodeKind {
        match self {
            Ast::Null => NodeKind::Null,
            Ast::Bool(_) => NodeKind::Bool,
            Ast::Int(_) => NodeKind::Int,
            Ast::Str(_) => NodeKind::Str,
            Ast::Variable(_) => NodeKind::Variable,
            Ast::Name(_) => NodeKind::Name,
            Ast::Assign { .. } => NodeKind::Assign,
            Ast::NotIdentical { .. } => NodeKind::NotIdentical,
            Ast::Ternary { .. } => NodeKind::Ternary,
            Ast::PropertyFetch { .. } => NodeKind::PropertyFetch,
            Ast::NullsafePropertyFetch { .. } => NodeKind::NullsafePropertyFetch,
            Ast::MethodCall { .. } => NodeKind::MethodCall,
            Ast::NullsafeMethodCall { .. } => NodeKind::NullsafeMethodCall,
            Ast::StaticCall { .. } => NodeKind::StaticCall,
            Ast::FuncCall { .. } => NodeKind::FuncCall,
            Ast::New { .. } => NodeKind::New,
            Ast::CloneExpr { .. } => NodeKind::CloneExpr,
            Ast::Closure { .. } => NodeKind::Closure,
            Ast::Expression(_) => NodeKind::Expression,
            Ast::Return(_) => NodeKind::Return,
            Ast::Function { .. } => NodeKind::Function,
            Ast::Class { .. } => NodeKind::Class,
            Ast::ClassMethod { .. } => NodeKind::ClassMethod,
            Ast::InlineStatements(_) => NodeKind::InlineStatements,
            Ast::Program(_) => NodeKind::Program,
        }
    }
}

impl Node {
    pub fn new(ast: Ast) -> Self {
        Self {
            ast,
            span: None,
            attrs: NodeAttrs::default(),
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }

    pub fn kind(&self) -> NodeKind {
        self.ast.kind()
    }

    /// Nodes built by rules have no source span
    pub fn is_synthesized(&self) -> bool {
        self.span.is_none()
    }

    /// Move the node out, leaving a synthesized `null` in its place
    pub fn take(&mut self) -> Node {
        std::mem::replace(self, Node::null())
    }

    pub fn null() -> Self {
        Self::new(Ast::Null)
    }

    pub fn int(value: i64) -> Self {
        Self::new(Ast::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::new(Ast::Str(value.into()))
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Self::new(Ast::Variable(name.into()))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Self::new(Ast::Name(name.into()))
    }

    pub fn assign(target: Node, value: Node) -> Self {
        Self::new(Ast::Assign {
            target: Box::new(target),
            value: Box::new(value),
        })
    }

    pub fn not_identical(left: Node, right: Node) -> Self {
        Self::new(Ast::NotIdentical {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn ternary(condition: Node, if_true: Node, if_false: Node) -> Self {
        Self::new(Ast::Ternary {
            condition: Box::new(condition),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        })
    }

    pub fn property_fetch(object: Node, property: impl Into<String>) -> Self {
        Self::new(Ast::PropertyFetch {
            object: Box::new(object),
            property: property.into(),
        })
    }

    pub fn nullsafe_property_fetch(object: Node, property: impl Into<String>) -> Self {
        Self::new(Ast::NullsafePropertyFetch {
            object: Box::new(object),
            property: property.into(),
        })
    }

    pub fn method_call(object: Node, method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self::new(Ast::MethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        })
    }

    pub fn nullsafe_method_call(object: Node, method: impl Into<String>, args: Vec<Arg>) -> Self {
        Self::new(Ast::NullsafeMethodCall {
            object: Box::new(object),
            method: method.into(),
            args,
        })
    }

    pub fn func_call(function: Node, args: Vec<Arg>) -> Self {
        Self::new(Ast::FuncCall {
            function: Box::new(function),
            args,
        })
    }

    pub fn new_instance(class: Node, args: Vec<Arg>) -> Self {
        Self::new(Ast::New {
            class: Box::new(class),
            args,
        })
    }

    pub fn clone_of(object: Node) -> Self {
        Self::new(Ast::CloneExpr {
            object: Box::new(object),
        })
    }

    pub fn expression(expr: Node) -> Self {
        Self::new(Ast::Expression(Box::new(expr)))
    }

    pub fn return_value(value: Node) -> Self {
        Self::new(Ast::Return(Some(Box::new(value))))
    }

    pub fn inline_statements(statements: Vec<Node>) -> Self {
        Self::new(Ast::InlineStatements(statements))
    }

    pub fn program(statements: Vec<Node>) -> Self {
        Self::new(Ast::Program(statements))
    }
}

/// Elements of comma-separated lists: arguments, parameters, closure uses
pub trait ListElement {
    fn span(&self) -> Option<Span>;
    fn attrs(&self) -> &NodeAttrs;
    fn attrs_mut(&mut self) -> &mut NodeAttrs;
}

/// Call argument: `$x`, `...$rest`, `&$ref`, `name: $x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub value: Node,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unpack: bool,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub attrs: NodeAttrs,
}

impl Arg {
    pub fn new(value: Node) -> Self {
        Self {
            value,
            name: None,
            unpack: false,
            by_ref: false,
            span: None,
            attrs: NodeAttrs::default(),
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }
}

/// Declared parameter of a function, method or closure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    #[serde(default)]
    pub type_hint: Option<String>,
    #[serde(default)]
    pub default: Option<Node>,
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub attrs: NodeAttrs,
}

impl Param {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_hint: None,
            default: None,
            variadic: false,
            by_ref: false,
            span: None,
            attrs: NodeAttrs::default(),
        }
    }

    pub fn typed(mut self, type_hint: impl Into<String>) -> Self {
        self.type_hint = Some(type_hint.into());
        self
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }
}

/// Variable captured by a closure: `use ($a, &$b)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosureUse {
    pub name: String,
    #[serde(default)]
    pub by_ref: bool,
    #[serde(default)]
    pub span: Option<Span>,
    #[serde(default)]
    pub attrs: NodeAttrs,
}

impl ClosureUse {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            by_ref: false,
            span: None,
            attrs: NodeAttrs::default(),
        }
    }

    pub fn with_span(mut self, start: usize, end: usize) -> Self {
        self.span = Some(Span::new(start, end));
        self
    }
}

macro_rules! impl_list_element {
    ($($ty:ty),*) => {
        $(
            impl ListElement for $ty {
                fn span(&self) -> Option<Span> {
                    self.span
                }

                fn attrs(&self) -> &NodeAttrs {
                    &self.attrs
                }

                fn attrs_mut(&mut self) -> &mut NodeAttrs {
                    &mut self.attrs
                }
            }
        )*
    };
}

impl_list_element!(Node, Arg, Param, ClosureUse);
