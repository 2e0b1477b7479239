/*!
# PHP 5.4 Downgrades

Rules lowering syntax introduced in PHP 5.4.
*/

pub mod instance_method_call;

pub use instance_method_call::InstanceMethodCallRule;
