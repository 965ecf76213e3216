//! Helper functions that don't belong elsewhere

mod backoff;

pub use backoff::Backoff;

use std::time::Duration;

/// Parses a positive number of whole seconds, falling back to the given default
/// for anything that is unparsable, zero or negative.
pub fn parse_seconds_or(src: &str, default: Duration) -> Duration {
    match src.trim().parse::<i64>() {
        Ok(seconds) if seconds > 0 => Duration::from_secs(seconds as u64),
        _ => default,
    }
}
