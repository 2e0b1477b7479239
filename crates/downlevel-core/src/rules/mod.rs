/*!
# Rule Catalog

Every downgrade rule shipped with this crate, grouped by the language version
that introduced the syntax it lowers.
*/

pub mod php54;
pub mod php80;

pub use php54::InstanceMethodCallRule;
pub use php80::{NullsafeToTernaryRule, TrailingCommasInParamUseRule};

use crate::engine::DowngradeRule;
use crate::{DownlevelConfig, DownlevelError, Result};

/// All rules with default settings
pub fn default_rules() -> Vec<Box<dyn DowngradeRule>> {
    configured_rules(&DownlevelConfig::default())
}

/// Names of all available rules, in catalog order
pub fn rule_names() -> Vec<&'static str> {
    default_rules().iter().map(|rule| rule.name()).collect()
}

/// Rules enabled by `config`, configured from it
///
/// Fails on rule names the catalog does not know.
pub fn rules_from_config(config: &DownlevelConfig) -> Result<Vec<Box<dyn DowngradeRule>>> {
    let available = configured_rules(config);
    let Some(selected) = &config.rules else {
        return Ok(available);
    };

    if let Some(unknown) = selected
        .iter()
        .find(|name| !available.iter().any(|rule| rule.name() == name.as_str()))
    {
        return Err(DownlevelError::UnknownRule(unknown.clone()));
    }

    Ok(available
        .into_iter()
        .filter(|rule| selected.iter().any(|name| name == rule.name()))
        .collect())
}

fn configured_rules(config: &DownlevelConfig) -> Vec<Box<dyn DowngradeRule>> {
    let mut rules: Vec<Box<dyn DowngradeRule>> = Vec::new();
    rules.push(Box::new(
        InstanceMethodCallRule::new().with_prefix(config.hoisted_variable_prefix.as_str()),
    ));
    rules.push(Box::new(
        NullsafeToTernaryRule::new()
            .with_prefix(config.nullsafe_variable_prefix.as_str())
            .strict_null_check(config.strict_null_check),
    ));
    rules.push(Box::new(TrailingCommasInParamUseRule::new()));
    rules
}
