//! Error types for Scholar.

use thiserror::Error;

/// Core error type for Scholar operations.
#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("Invalid role: {0}")]
    InvalidRole(String),
}
