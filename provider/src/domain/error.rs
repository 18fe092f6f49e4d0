//! Domain-level error types.
//!
//! Handlers report failures as an [`Error`]: a stable [`ErrorCode`] plus the
//! contextual message built while unwinding the lookup or directory call. The
//! provider binary prints it as the JSON envelope `{"code": .., "message": ..}`.

use std::fmt;

use serde::Serialize;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request is malformed or was rejected by Jira as invalid.
    InvalidRequest,
    /// The requested user does not exist.
    NotFound,
    /// Jira could not be reached or kept refusing the request.
    ServiceUnavailable,
    /// An unexpected error occurred inside the provider.
    InternalError,
}

impl ErrorCode {
    fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid request",
            Self::NotFound => "jira user not found",
            Self::ServiceUnavailable => "jira unavailable",
            Self::InternalError => "internal provider error",
        }
    }
}

/// Handler error payload.
///
/// The message is never blank: an empty or whitespace-only message is
/// replaced by a generic description of the code.
///
/// # Examples
/// ```
/// use jira_provider::domain::{Error, ErrorCode};
///
/// let err = Error::new(ErrorCode::NotFound, "getting jira user failed: gone");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(Error::not_found(" ").message(), "jira user not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Error {
    code: ErrorCode,
    message: String,
}

impl Error {
    /// Create an error with `code` and `message`.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self { code, message }
    }

    /// Stable machine-readable error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Shorthand for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Shorthand for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Shorthand for [`ErrorCode::ServiceUnavailable`].
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    /// Shorthand for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::invalid(Error::invalid_request("bad"), ErrorCode::InvalidRequest)]
    #[case::missing(Error::not_found("gone"), ErrorCode::NotFound)]
    #[case::down(Error::service_unavailable("down"), ErrorCode::ServiceUnavailable)]
    #[case::bug(Error::internal("oops"), ErrorCode::InternalError)]
    fn shorthands_set_their_code(#[case] error: Error, #[case] expected: ErrorCode) {
        assert_eq!(error.code(), expected);
    }

    #[rstest]
    #[case::empty("")]
    #[case::whitespace("   ")]
    fn blank_messages_fall_back_to_the_code_description(#[case] message: &str) {
        let error = Error::service_unavailable(message);
        assert_eq!(error.message(), "jira unavailable");
        assert_eq!(error.to_string(), "jira unavailable");
    }

    #[rstest]
    fn envelope_uses_snake_case_codes() {
        let value = serde_json::to_value(Error::service_unavailable("jira down"))
            .expect("serialise error");
        assert_eq!(
            value,
            json!({ "code": "service_unavailable", "message": "jira down" })
        );
    }
}
