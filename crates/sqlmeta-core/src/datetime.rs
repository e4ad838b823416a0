//! SQL datetime helpers
//!
//! SQLite has no datetime type; values are stored as text. These helpers
//! convert between the stored forms and a human-readable one.

use chrono::{DateTime, NaiveDateTime, Utc};

/// Format used when writing datetimes into SQL statements
pub const SQL_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format of datetimes read back as ISO-8601 UTC text
pub const SQL_OUTPUT_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Format for displaying datetimes to users
pub const DATETIME_PRINT_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Render a timestamp for storage
pub fn to_sql_datetime(at: DateTime<Utc>) -> String {
    at.format(SQL_DATETIME_FORMAT).to_string()
}

/// Reformat a stored `YYYY-MM-DDTHH:MM:SSZ` value for display
///
/// Returns `None` if the value is not in that format.
pub fn sql_datetime_print(value: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(value, SQL_OUTPUT_DATETIME_FORMAT)
        .ok()
        .map(|dt| dt.format(DATETIME_PRINT_FORMAT).to_string())
}
