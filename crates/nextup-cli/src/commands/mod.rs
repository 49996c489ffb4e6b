pub mod plan;
pub mod task;
pub mod window;

use std::error::Error;

use chrono::{DateTime, Utc};

/// Resolve an optional `--at` RFC3339 argument, defaulting to now.
pub(crate) fn resolve_at(at: Option<String>) -> Result<DateTime<Utc>, Box<dyn Error>> {
    match at {
        Some(s) => Ok(DateTime::parse_from_rfc3339(&s)?.with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}
