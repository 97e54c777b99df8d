//! Parsing of the `retry-after` response header
//!
//! The header is either a number of seconds or an HTTP date (RFC 7231).

use tracing::debug;

/// Seconds to wait according to a `retry-after` header value.
///
/// Dates in the past yield `Some(0)`; unparseable values yield `None`.
///
/// ```
/// use cloak_egress::parse_retry_after;
///
/// assert_eq!(parse_retry_after("60"), Some(60));
/// assert_eq!(parse_retry_after("soon"), None);
/// ```
pub fn parse_retry_after(header_value: &str) -> Option<u64> {
    let value = header_value.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    match chrono::DateTime::parse_from_rfc2822(value) {
        Ok(target_time) => {
            let seconds = target_time
                .signed_duration_since(chrono::Utc::now())
                .num_seconds()
                .max(0) as u64;
            Some(seconds)
        }
        Err(_) => {
            debug!(header_value, "Ignoring unparseable retry-after header");
            None
        }
    }
}
