/*!
# PHP 8.0 Downgrades

Rules lowering syntax introduced in PHP 8.0.
*/

pub mod nullsafe_to_ternary;
pub mod trailing_commas;

pub use nullsafe_to_ternary::NullsafeToTernaryRule;
pub use trailing_commas::TrailingCommasInParamUseRule;
