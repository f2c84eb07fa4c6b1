//! Scholar Core - Core types and domain models for the Scholar chatbot backend.

mod error;
mod types;

pub use error::Error;
pub use types::*;
