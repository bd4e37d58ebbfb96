//! Error types for the Palisade compiler
//!
//! Errors are structured with fields to aid debugging: each variant carries
//! the context a caller needs to point at the offending input (rule index,
//! raw token, group name). All errors are values returned to the caller; the
//! compiler never logs-and-continues past a malformed rule, because a
//! partially compiled policy set can silently admit traffic an author meant
//! to deny.

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Palisade operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An endpoint token in a rule failed classification
    #[error("invalid endpoint {token:?} in rule {rule}: {reason}")]
    InvalidEndpoint {
        /// Zero-based index of the rule containing the token
        rule: usize,
        /// The raw token that failed to classify
        token: String,
        /// Description of what's malformed
        reason: String,
    },

    /// A member entry in the groups table failed classification
    #[error("invalid member {token:?} in group {group:?}: {reason}")]
    InvalidMember {
        /// Name of the group whose member list is invalid
        group: String,
        /// The raw member entry that failed to classify
        token: String,
        /// Description of what's malformed
        reason: String,
    },

    /// A rule references a group absent from the groups table
    #[error("rule {rule} references unknown group {name:?}")]
    UnknownGroup {
        /// Zero-based index of the referencing rule
        rule: usize,
        /// The normalized group name that could not be resolved
        name: String,
    },

    /// Document failed structural validation
    #[error("validation error: {message}")]
    Validation {
        /// Description of what's invalid
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}
