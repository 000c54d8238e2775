//! Validation error types

use std::fmt;

use thiserror::Error;

/// Error produced when reconstructing an entity from an untyped record.
///
/// Carries every violated constraint found in the record, not just the
/// first one, so callers can report the full set of problems at once.
#[derive(Debug, Clone, Error)]
pub struct ValidationError {
    pub violations: Vec<String>,
}

impl ValidationError {
    /// Create a validation error from a list of violations.
    pub fn new(violations: Vec<String>) -> Self {
        Self { violations }
    }

    /// Create a validation error with a single violation.
    pub fn single(violation: impl Into<String>) -> Self {
        Self {
            violations: vec![violation.into()],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid record: {}", self.violations.join("; "))
    }
}
