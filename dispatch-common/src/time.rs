//! Timestamp utilities

use chrono::{DateTime, Local, NaiveDateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current wall-clock time in the server's local zone.
///
/// Dispatch dates printed on slips are local times without an offset, so
/// back-filled dates use the same representation.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
