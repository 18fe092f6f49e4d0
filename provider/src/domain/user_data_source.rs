//! Read-only user data source keyed by email.
//!
//! Projects the lookup result onto data-source state. The search endpoint may
//! match fuzzily, so more than one user can come back; the first one in
//! server order is always the one selected.

use serde::Serialize;
use tracing::warn;

use crate::domain::user::{AccountId, JiraUser};
use crate::domain::user_lookup::{LookupFailure, UserLookupError, UserLookupService};
use crate::domain::{Error, HandlerResult};

/// Persisted state of the user data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDataSourceState {
    /// Email the data source was queried with.
    pub email: String,
    /// Account id of the selected user; `None` when nothing matched.
    pub id: Option<AccountId>,
    /// Display name of the selected user.
    pub display_name: Option<String>,
}

/// Pick the user a lookup result resolves to.
///
/// Returns the first user and logs a warning when the result is ambiguous.
///
/// # Examples
/// ```
/// use jira_provider::domain::select_user;
///
/// assert!(select_user("ada@example.com", Vec::new()).is_none());
/// ```
pub fn select_user(email: &str, users: Vec<JiraUser>) -> Option<JiraUser> {
    if users.len() > 1 {
        warn!(
            email,
            count = users.len(),
            "jira user search matched several users; using the first"
        );
    }
    users.into_iter().next()
}

/// Data-source handler backed by the retrying lookup.
pub struct UserDataSource {
    lookup: UserLookupService,
}

impl UserDataSource {
    /// Build the data source over a lookup service.
    pub fn new(lookup: UserLookupService) -> Self {
        Self { lookup }
    }

    /// Read the data source for `email`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] prefixed with "getting jira user failed" when the
    /// lookup fails. An email with no matching user is not an error.
    pub async fn read(&self, email: &str) -> HandlerResult<UserDataSourceState> {
        let users = self
            .lookup
            .lookup_user_by_email(email)
            .await
            .map_err(map_lookup_error)?;
        let selected = select_user(email, users);
        Ok(UserDataSourceState {
            email: email.to_owned(),
            id: selected.as_ref().map(|user| user.account_id.clone()),
            display_name: selected.map(|user| user.display_name),
        })
    }
}

pub(crate) fn map_lookup_error(error: UserLookupError) -> Error {
    let message = error.to_string();
    match error.into_cause() {
        LookupFailure::InvalidRequest { .. } => Error::invalid_request(message),
        LookupFailure::Upstream { status: 404, .. } => Error::not_found(message),
        LookupFailure::Upstream { status, .. } if (400..500).contains(&status) && status != 429 => {
            Error::invalid_request(message)
        }
        LookupFailure::Decode { .. } => Error::internal(message),
        LookupFailure::Transport { .. }
        | LookupFailure::Upstream { .. }
        | LookupFailure::MalformedRateLimitHeader { .. }
        | LookupFailure::RetryAfterTooLong { .. }
        | LookupFailure::RateLimitExhausted { .. }
        | LookupFailure::DeadlineExceeded { .. } => Error::service_unavailable(message),
    }
}
