//! Driven port for the Jira user directory.
//!
//! The domain owns the request shape and the per-attempt response contract so
//! the lookup retry policy can interpret status codes and headers without
//! depending on an HTTP client.

use std::collections::BTreeMap;

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::user::{AccountId, JiraUser, NewJiraUser, UserValidationError};

/// Result count requested from the search endpoint.
pub const LOOKUP_MAX_RESULTS: u32 = 1;

/// Domain-owned user search request. Built once per lookup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    email: String,
    max_results: u32,
}

impl LookupRequest {
    /// Build a search request for `email`.
    ///
    /// The address is not checked for RFC 5322 syntax; only blank input is
    /// rejected.
    ///
    /// # Examples
    /// ```
    /// use jira_provider::domain::ports::LookupRequest;
    ///
    /// let request = LookupRequest::new("ada@example.com").expect("valid email");
    /// assert_eq!(request.max_results(), 1);
    /// assert!(LookupRequest::new("  ").is_err());
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        Ok(Self {
            email,
            max_results: LOOKUP_MAX_RESULTS,
        })
    }

    /// Email used as the search query.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Maximum number of users the directory is asked to return.
    pub fn max_results(&self) -> u32 {
        self.max_results
    }
}

/// Case-insensitive response header mapping.
///
/// Names are folded to ASCII lowercase on insert and lookup; the last value
/// inserted for a name wins.
///
/// # Examples
/// ```
/// use jira_provider::domain::ports::ResponseHeaders;
///
/// let headers: ResponseHeaders = [("Retry-After", "3")].into_iter().collect();
/// assert_eq!(headers.get("retry-after"), Some("3"));
/// assert_eq!(headers.get("RETRY-AFTER"), Some("3"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(BTreeMap<String, String>);

impl ResponseHeaders {
    /// Insert or replace a header value.
    pub fn insert(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.0
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
    }

    /// Look up a header value by name, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Return whether no headers were captured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ResponseHeaders
where
    K: AsRef<str>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::default();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

/// One search round-trip as seen by the retry policy.
///
/// `users` is only populated for successful responses; `body` keeps a compact
/// preview of the payload for error reporting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupAttempt {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: ResponseHeaders,
    /// Users decoded from a successful response, in server order.
    pub users: Vec<JiraUser>,
    /// Body preview.
    pub body: String,
}

impl LookupAttempt {
    /// Build a successful attempt carrying `users`.
    pub fn found(users: Vec<JiraUser>) -> Self {
        Self {
            status: 200,
            users,
            ..Self::default()
        }
    }

    /// Build a failed attempt with `status` and a body preview.
    pub fn failed(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            ..Self::default()
        }
    }

    /// Attach a header to the attempt.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Return whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Return whether Jira asked the caller to slow down (HTTP 429).
    pub fn is_rate_limited(&self) -> bool {
        self.status == 429
    }

    /// Raw `Retry-After` header value, if present.
    pub fn retry_after(&self) -> Option<&str> {
        self.headers.get("retry-after")
    }
}

define_port_error! {
    /// Errors surfaced while calling the Jira user directory.
    pub enum JiraUserDirectoryError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "jira transport failed: {message}",
        /// Request exceeded the client timeout.
        Timeout { message: String } =>
            "jira request timed out: {message}",
        /// Jira answered with a non-success status.
        Upstream { status: u16, body: String } =>
            "jira responded with status {status}: {body}",
        /// Response body could not be decoded.
        Decode { message: String } =>
            "jira response decode failed: {message}",
        /// Adapter rejected the request before execution.
        InvalidRequest { message: String } =>
            "jira request invalid: {message}",
    }
}

impl JiraUserDirectoryError {
    /// Return whether no response was obtained at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Timeout { .. })
    }
}

/// Port for reading and mutating Jira user accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JiraUserDirectory: Send + Sync {
    /// Run one user search round-trip.
    ///
    /// Any HTTP response, including 429 and other error statuses, is returned
    /// as a [`LookupAttempt`]; only failures without a response (or an
    /// undecodable success body) are errors.
    async fn search_users(
        &self,
        request: &LookupRequest,
    ) -> Result<LookupAttempt, JiraUserDirectoryError>;

    /// Fetch one user by account id.
    async fn get_user(&self, account_id: &AccountId) -> Result<JiraUser, JiraUserDirectoryError>;

    /// Create a user and return the record Jira stored.
    async fn create_user(&self, draft: &NewJiraUser) -> Result<JiraUser, JiraUserDirectoryError>;

    /// Delete a user by account id.
    async fn delete_user(&self, account_id: &AccountId) -> Result<(), JiraUserDirectoryError>;
}
