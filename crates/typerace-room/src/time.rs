//! Wall-clock helper.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
///
/// Room timestamps (`createdAt`, `startTime`) are wall-clock millis so
/// clients can compute elapsed times against their own clocks.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
