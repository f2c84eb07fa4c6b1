//! Database CRUD operations.

pub mod chat_history;
pub mod files;
pub mod users;

use chrono::{DateTime, NaiveDateTime, Utc};

/// Parse a stored timestamp, falling back to now for rows written before the
/// column existed.
///
/// Rows are written as RFC 3339; `CURRENT_TIMESTAMP` style values from older
/// databases are accepted too.
pub(crate) fn parse_timestamp(value: Option<String>) -> DateTime<Utc> {
    value
        .and_then(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                        .map(|naive| naive.and_utc())
                        .ok()
                })
        })
        .unwrap_or_else(Utc::now)
}
