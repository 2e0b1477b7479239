/*!
# Downgrade Engine

Rule dispatch over a parsed file.

## Architecture

- `DowngradeRule`: a rewrite that claims a set of node kinds
- `Dispatcher`: walks a tree and hands each node to the rules that claimed its kind
- `FreshNameAllocator`: hygienic temporary names, counters reset per file
- `RuleContext`: everything a rule may consult for the file being processed
- `FileRunner`: sequential multi-file driver built on one dispatcher

## Example Usage

```rust
use downlevel_core::engine::{Dispatcher, FileId};
use downlevel_core::rules::php80::NullsafeToTernaryRule;
use downlevel_core::tokens::TokenStream;
use downlevel_core::ast::Node;

let mut dispatcher = Dispatcher::new();
dispatcher.add_rule(Box::new(NullsafeToTernaryRule::new()));

let tree = Node::program(vec![]);
let rewritten = dispatcher.run(&FileId::new("src/a.php"), tree, &TokenStream::default());
```
*/

pub mod dispatcher;
pub mod file_runner;
pub mod hygiene;
pub mod rules;
pub mod walker;

pub use dispatcher::Dispatcher;
pub use file_runner::{FileRunner, ProcessedUnit, RunSummary, SourceUnit};
pub use hygiene::FreshNameAllocator;
pub use rules::{CodeSample, DowngradeRule, RuleStats};

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ast::{Node, Span};
use crate::tokens::{self, TokenStream};

/// Identity of a source file within one run
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for FileId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Outcome of applying a rule to one node
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite {
    /// The node was left untouched
    Unchanged,
    /// The node kept its identity; only its attributes (or its list elements'
    /// attributes) changed
    Mutated,
    /// The node is replaced by a new subtree, which is then revisited
    Replace(Node),
}

impl Rewrite {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, Rewrite::Unchanged)
    }
}

/// Per-file state handed to every rule invocation
///
/// Rules keep no per-file fields of their own; the file identity, its tokens
/// and the name allocator all arrive through here.
pub struct RuleContext<'a> {
    file: Option<&'a FileId>,
    tokens: Option<&'a TokenStream>,
    names: &'a mut FreshNameAllocator,
    reserved: &'a HashSet<String>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        file: Option<&'a FileId>,
        tokens: Option<&'a TokenStream>,
        names: &'a mut FreshNameAllocator,
        reserved: &'a HashSet<String>,
    ) -> Self {
        Self {
            file,
            tokens,
            names,
            reserved,
        }
    }

    pub fn file(&self) -> Option<&FileId> {
        self.file
    }

    pub fn tokens(&self) -> Option<&TokenStream> {
        self.tokens
    }

    /// See [`tokens::is_followed_by_separator`]
    pub fn is_followed_by_separator(&self, span: Option<Span>) -> bool {
        tokens::is_followed_by_separator(self.tokens, span)
    }

    /// Allocate a variable name unused in the current file
    ///
    /// Returns `None` when the tree is not associated with a file, in which case
    /// no hygienic name can be guaranteed.
    pub fn fresh_variable(&mut self, prefix: &str) -> Option<Node> {
        let file = self.file?;
        let name = self.names.allocate(file, prefix, self.reserved);
        Some(Node::variable(name))
    }

    pub fn null(&self) -> Node {
        Node::null()
    }
}
