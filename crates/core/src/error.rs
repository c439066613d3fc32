//! Domain error model.

use thiserror::Error;

/// Domain-level error.
///
/// Deterministic failures only (validation, configuration, identifiers).
/// Remote service and storage failures have their own error types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed order data).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Required configuration is missing or malformed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_matching_variants() {
        assert_eq!(
            DomainError::validation("bad line").to_string(),
            "validation failed: bad line"
        );
        assert_eq!(
            DomainError::configuration("missing account codes: sales").to_string(),
            "configuration error: missing account codes: sales"
        );
        assert!(matches!(DomainError::invalid_id("x"), DomainError::InvalidId(msg) if msg == "x"));
    }
}
