//! Scholar DB - Relational persistence for accounts, chat history and uploads.

mod database;
mod error;
mod migrations;
mod operations;

pub use database::Database;
pub use error::{DbError, DbResult};
pub use migrations::ColumnPatch;
