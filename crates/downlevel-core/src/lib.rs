//! # Downlevel Core
//!
//! Rule-driven syntax downgrade engine, including:
//! - Abstract Syntax Tree (AST) definitions with printer attributes
//! - Token streams and trailing-separator detection
//! - Rule dispatcher, hygienic name allocation and a multi-file runner
//! - Downgrade rules for newer PHP syntax
//!
//! Parsing source text into trees is left to an external parser; trees and
//! tokens are handed over as structured data (or JSON, via serde).

#![warn(clippy::all)]

pub mod ast;
pub mod engine;
pub mod rules;
pub mod tokens;

use std::path::Path;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use ast::{Arg, Ast, ClosureUse, Node, NodeAttrs, NodeKind, Param, Span};
pub use engine::{
    Dispatcher, DowngradeRule, FileId, FileRunner, Rewrite, RuleContext, RunSummary, SourceUnit,
};
pub use tokens::{Token, TokenKind, TokenStream};

/// Downlevel version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for downlevel components
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("downlevel_core=info"));
    // A subscriber installed earlier (tests, embedding tools) wins
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Downgrade run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownlevelConfig {
    /// Prefix of temporaries introduced by nullsafe lowering
    pub nullsafe_variable_prefix: String,
    /// Prefix of temporaries introduced when hoisting `new`/`clone` receivers
    pub hoisted_variable_prefix: String,
    /// Compare against `null` explicitly instead of testing truthiness
    pub strict_null_check: bool,
    /// How many times in a row a replacement may itself be replaced
    pub max_revisits: usize,
    /// Enabled rule names; all rules when unset
    pub rules: Option<Vec<String>>,
    /// Print unchanged nodes from the original source text
    pub preserve_formatting: bool,
}

impl Default for DownlevelConfig {
    fn default() -> Self {
        Self {
            nullsafe_variable_prefix: rules::php80::nullsafe_to_ternary::DEFAULT_PREFIX.to_string(),
            hoisted_variable_prefix: rules::php54::instance_method_call::DEFAULT_PREFIX.to_string(),
            strict_null_check: false,
            max_revisits: 32,
            rules: None,
            preserve_formatting: true,
        }
    }
}

impl DownlevelConfig {
    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (field, prefix) in [
            ("nullsafe_variable_prefix", &self.nullsafe_variable_prefix),
            ("hoisted_variable_prefix", &self.hoisted_variable_prefix),
        ] {
            let valid = prefix
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(DownlevelError::Config(format!(
                    "{field} must be a valid variable name, got {prefix:?}"
                )));
            }
        }
        if self.nullsafe_variable_prefix == self.hoisted_variable_prefix {
            return Err(DownlevelError::Config(
                "nullsafe and hoisted variable prefixes must differ".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error types for downlevel operations
#[derive(thiserror::Error, Debug)]
pub enum DownlevelError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON input or configuration
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rule name not present in the catalog
    #[error("Unknown rule: {0}")]
    UnknownRule(String),
}

/// Result type for downlevel operations
pub type Result<T> = std::result::Result<T, DownlevelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DownlevelConfig::default();
        assert_eq!(config.nullsafe_variable_prefix, "nullsafeVariable");
        assert_eq!(config.hoisted_variable_prefix, "object");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_json() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("downlevel.json");
        std::fs::write(&path, r#"{ "max_revisits": 4, "rules": ["NullsafeToTernary"] }"#)?;

        let config = DownlevelConfig::from_json_file(&path)?;
        assert_eq!(config.max_revisits, 4);
        assert_eq!(config.rules, Some(vec!["NullsafeToTernary".to_string()]));
        assert_eq!(config.nullsafe_variable_prefix, "nullsafeVariable");
        Ok(())
    }

    #[test]
    fn test_config_rejects_bad_prefix() {
        let config = DownlevelConfig {
            nullsafe_variable_prefix: "9lives".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DownlevelError::Config(_))));

        let config = DownlevelConfig {
            hoisted_variable_prefix: "nullsafeVariable".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(DownlevelError::Config(_))));
    }

    #[test]
    fn test_config_missing_file() {
        let result = DownlevelConfig::from_json_file("/definitely/not/here.json");
        assert!(matches!(result, Err(DownlevelError::Io(_))));
    }
}
