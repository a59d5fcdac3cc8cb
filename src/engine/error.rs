//! Error types for calculator requests.

use thiserror::Error;

use crate::model::Category;

/// Top-level error returned by [`Engine::apply`](super::Engine::apply).
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("no withdrawal calculation to distribute, run the withdrawal calculator first")]
    LinkageMissing,
}

/// Rejected user input. Nothing is recorded when validation fails.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{field} is not a number")]
    NotNumeric { field: &'static str },

    #[error("{field} must be greater than zero, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("at least one customer amount is required")]
    NoCustomers,

    #[error("{category} result is too large to represent")]
    OutOfRange { category: Category },
}
