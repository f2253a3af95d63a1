//! Library error type.
//!
//! Every failure in the rewriting core is unrecoverable at the raise site:
//! an error aborts the enclosing `execute` call and leaves the tree in
//! whatever state preceded the failing rule.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Error
// ============================================================================

/// Errors raised by wrap chains, the spec resolver and the rule interpreter.
#[derive(Debug, Error)]
pub enum Error {
    /// Wrap chain invariant violated at construction.
    #[error("invalid wrap chain at index {index}: {reason}")]
    Structure { index: usize, reason: String },

    /// Malformed spec, pattern, direction token or operation argument.
    #[error("{0}")]
    Usage(String),

    /// Operation needs a parent or a non-empty chain and has neither.
    #[error("{0}")]
    Unbound(String),

    /// Rule could not be executed.
    #[error("rule `{rule}`: {message}")]
    Rule { rule: String, message: String },

    /// Tree adapter refused an insertion that would create a cycle.
    #[error("cannot insert {node} into its own subtree")]
    Hierarchy { node: String },

    /// Error raised by a caller-supplied predicate, transform or resolver.
    #[error(transparent)]
    Callback(#[from] anyhow::Error),
}

impl Error {
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }

    pub fn unbound(message: impl Into<String>) -> Self {
        Self::Unbound(message.into())
    }

    pub fn structure(index: usize, reason: impl Into<String>) -> Self {
        Self::Structure {
            index,
            reason: reason.into(),
        }
    }

    pub fn rule(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rule {
            rule: rule.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::structure(2, "expected exactly one child, found 3");
        assert_eq!(
            err.to_string(),
            "invalid wrap chain at index 2: expected exactly one child, found 3"
        );

        let err = Error::rule("strip spans", "operation `nope` is not registered");
        assert_eq!(
            err.to_string(),
            "rule `strip spans`: operation `nope` is not registered"
        );
    }
}
