//! Error types for range-resolver operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),
}

pub type Result<T> = std::result::Result<T, RangeError>;
