/*!
# File Runner - Multi-file Downgrade Driver

Feeds parsed source units through one dispatcher, one file at a time. Units
arrive as JSON documents produced by an external parser: the file path, the
tree, and optionally the original text and its tokens.
*/

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ast::{Node, SourcePrinter, ToSource};
use crate::tokens::TokenStream;
use crate::DownlevelConfig;

use super::{Dispatcher, FileId};

/// One parsed file as handed over by the parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub path: FileId,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tokens: Option<TokenStream>,
    pub ast: Node,
}

impl SourceUnit {
    pub fn new(path: impl Into<FileId>, ast: Node) -> Self {
        Self {
            path: path.into(),
            source: None,
            tokens: None,
            ast,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_tokens(mut self, tokens: TokenStream) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse source unit {}", path.display()))
    }

    /// Tokens of the unit, scanned from the source text when the parser did
    /// not provide them
    fn token_stream(&self) -> TokenStream {
        match (&self.tokens, &self.source) {
            (Some(tokens), _) => tokens.clone(),
            (None, Some(source)) => TokenStream::scan(source),
            (None, None) => TokenStream::default(),
        }
    }
}

/// A unit after all rules ran over it
#[derive(Debug, Clone)]
pub struct ProcessedUnit {
    pub path: FileId,
    pub ast: Node,
    pub source: Option<String>,
    pub tokens: TokenStream,
    pub changed: bool,
    preserve_formatting: bool,
}

impl ProcessedUnit {
    /// Print the rewritten tree, reusing original text where still valid
    pub fn render(&self) -> String {
        match &self.source {
            Some(source) if self.preserve_formatting => {
                SourcePrinter::with_original(source, &self.tokens).print(&self.ast)
            }
            _ => self.ast.to_source(),
        }
    }

    /// The rewritten unit, for printers further down the pipeline
    pub fn into_unit(self) -> SourceUnit {
        SourceUnit {
            path: self.path,
            source: self.source,
            tokens: Some(self.tokens),
            ast: self.ast,
        }
    }
}

/// Sequential driver over many files sharing one dispatcher
pub struct FileRunner {
    dispatcher: Dispatcher,
    preserve_formatting: bool,
}

impl FileRunner {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            preserve_formatting: true,
        }
    }

    pub fn from_config(config: &DownlevelConfig) -> crate::Result<Self> {
        Ok(Self::new(Dispatcher::from_config(config)?).preserve_formatting(config.preserve_formatting))
    }

    /// Whether rendering copies unchanged nodes from the original text
    pub fn preserve_formatting(mut self, preserve: bool) -> Self {
        self.preserve_formatting = preserve;
        self
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Run every rule over one unit
    pub fn process_unit(&mut self, unit: SourceUnit) -> ProcessedUnit {
        let tokens = unit.token_stream();
        let before = unit.ast.clone();
        let ast = self.dispatcher.run(&unit.path, unit.ast, &tokens);
        let changed = ast != before;

        debug!(file = %unit.path, changed, "processed unit");
        ProcessedUnit {
            path: unit.path,
            ast,
            source: unit.source,
            tokens,
            changed,
            preserve_formatting: self.preserve_formatting,
        }
    }

    /// Load and process each unit file in order, handing results to `sink`
    ///
    /// A file that cannot be loaded or whose result the sink rejects is
    /// recorded in the summary; the remaining files are still processed.
    pub fn process_files<P, F>(&mut self, paths: &[P], mut sink: F) -> RunSummary
    where
        P: AsRef<Path>,
        F: FnMut(ProcessedUnit) -> Result<()>,
    {
        let mut summary = RunSummary::new();

        for path in paths {
            let path = path.as_ref();
            let unit = match SourceUnit::from_json_file(path) {
                Ok(unit) => unit,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "skipping unit");
                    summary.errors.push(format!("Error processing {}: {e:#}", path.display()));
                    continue;
                }
            };

            let processed = self.process_unit(unit);
            summary.files_processed += 1;
            if processed.changed {
                summary.files_rewritten += 1;
            }
            info!(file = %processed.path, changed = processed.changed, "downgraded");

            if let Err(e) = sink(processed) {
                summary.errors.push(format!("Error writing {}: {e:#}", path.display()));
            }
        }

        summary
    }
}

/// Summary of a multi-file run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunSummary {
    pub files_processed: u64,
    pub files_rewritten: u64,
    pub errors: Vec<String>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::php80::NullsafeToTernaryRule;
    use pretty_assertions::assert_eq;

    fn runner() -> FileRunner {
        let mut dispatcher = Dispatcher::new();
        dispatcher.add_rule(Box::new(NullsafeToTernaryRule::new()));
        FileRunner::new(dispatcher)
    }

    fn nullsafe_unit(path: &str) -> SourceUnit {
        SourceUnit::new(
            path,
            Node::program(vec![Node::expression(Node::nullsafe_method_call(
                Node::variable("a"),
                "b",
                vec![],
            ))]),
        )
    }

    #[test]
    fn test_counters_restart_in_each_file() {
        let mut runner = runner();
        let first = runner.process_unit(nullsafe_unit("a.php"));
        let second = runner.process_unit(nullsafe_unit("b.php"));

        assert!(first.changed);
        assert_eq!(first.render(), "($nullsafeVariable1 = $a) ? $nullsafeVariable1->b() : null;");
        assert_eq!(second.render(), first.render());
    }

    #[test]
    fn test_untouched_unit_is_reported_unchanged() {
        let source = "$a->b();";
        let unit = SourceUnit::new(
            "a.php",
            Node::program(vec![Node::expression(
                Node::method_call(Node::variable("a").with_span(0, 2), "b", vec![]).with_span(0, 7),
            )
            .with_span(0, 8)]),
        )
        .with_source(source);

        let processed = runner().process_unit(unit);
        assert!(!processed.changed);
        assert_eq!(processed.render(), source);
    }

    #[test]
    fn test_process_files_records_errors() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let good = dir.path().join("good.json");
        let bad = dir.path().join("bad.json");
        fs::write(&good, serde_json::to_string(&nullsafe_unit("src/good.php"))?)?;
        fs::write(&bad, "{ not json")?;

        let mut rendered = Vec::new();
        let summary = runner().process_files(&[&bad, &good], |unit| {
            rendered.push((unit.path.to_string(), unit.render()));
            Ok(())
        });

        assert_eq!(summary.files_processed, 1);
        assert_eq!(summary.files_rewritten, 1);
        assert_eq!(summary.errors.len(), 1);
        assert!(summary.errors[0].contains("bad.json"));
        assert!(!summary.success());
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].0, "src/good.php");
        Ok(())
    }
}
