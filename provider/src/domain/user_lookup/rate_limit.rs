//! `Retry-After` header interpretation.
//!
//! Only the delta-seconds form is accepted. Anything else is reported to the
//! caller, which treats it as a terminal failure instead of retrying with no
//! wait.

use std::time::Duration;

/// A `Retry-After` value that is not a non-negative whole number of seconds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Retry-After value {value:?} is not a whole number of seconds")]
pub(crate) struct InvalidRetryAfter {
    pub(crate) value: String,
}

/// Parse a `Retry-After` header value into the wait it requests.
///
/// Only ASCII digits are accepted; a leading sign is rejected.
pub(crate) fn parse_retry_after(value: &str) -> Result<Duration, InvalidRetryAfter> {
    let invalid = || InvalidRetryAfter {
        value: value.to_owned(),
    };
    let digits = value.trim();
    if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(invalid());
    }
    digits
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|_| invalid())
}
