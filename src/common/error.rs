//! Error types for sketch operations

use std::fmt;

/// Errors that can occur during sketch or tracker construction and merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SketchError {
    /// Invalid parameter provided to a constructor (`k == 0`, `width == 0`, `depth == 0`,
    /// or an (ε, δ) pair outside `(0, 1)`)
    InvalidShape {
        /// Parameter name
        param: String,
        /// Invalid value provided
        value: String,
        /// Constraint that was violated
        constraint: String,
    },

    /// Attempted to merge two sketches with different `(width, depth, seed)`
    IncompatibleShape {
        /// Reason for incompatibility
        reason: String,
    },
}

impl fmt::Display for SketchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SketchError::InvalidShape {
                param,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "invalid parameter '{}': value '{}' {}",
                    param, value, constraint
                )
            }
            SketchError::IncompatibleShape { reason } => {
                write!(f, "incompatible sketch shape: {}", reason)
            }
        }
    }
}

impl std::error::Error for SketchError {}

/// Result type alias for sketch and tracker operations
pub type Result<T> = std::result::Result<T, SketchError>;
