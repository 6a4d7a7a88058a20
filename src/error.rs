//! Errors returned by filter construction and insertion.

use thiserror::Error;

/// The error type for filter operations.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum FilterError {
    /// A sizing parameter passed at construction is zero or otherwise unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// Every slot of a quotient filter is already taken.
    #[error("filter is full: all {capacity} slots are occupied")]
    FilterFull {
        /// Number of slots in the filter.
        capacity: usize,
    },
    /// Two filters cannot be combined because their shapes differ.
    #[error("incompatible filters: {0}")]
    IncompatibleFilters(String),
}

/// A specialized `Result` type for filter operations.
pub type Result<T> = std::result::Result<T, FilterError>;

pub(crate) fn invalid_configuration(message: impl Into<String>) -> FilterError {
    FilterError::InvalidConfiguration(message.into())
}
