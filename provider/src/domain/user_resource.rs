//! Managed Jira user resource.
//!
//! Create, read, import and delete go straight to the directory. Update is a
//! no-op: once an account exists, changes to its email or display name are
//! suppressed at plan time (see [`suppress_diff`]) and never sent to Jira.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::ports::{JiraUserDirectory, JiraUserDirectoryError};
use crate::domain::user::{AccountId, NewJiraUser};
use crate::domain::{Error, HandlerResult};

const READ_FAILED: &str = "getting jira user failed";
const REQUEST_FAILED: &str = "request failed";

/// Persisted state of one managed user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResourceState {
    /// Jira account id; the resource identity.
    pub id: AccountId,
    /// Email address of the account.
    pub email: String,
    /// Display name of the account.
    pub display_name: String,
}

/// Decide whether a planned attribute change should be ignored.
///
/// Changes are only honoured before the resource exists (`old` is empty), and
/// even then only an unchanged empty value counts as "no diff". After creation
/// every change is suppressed.
///
/// # Examples
/// ```
/// use jira_provider::domain::suppress_diff;
///
/// assert!(!suppress_diff("", "ada@example.com"));
/// assert!(suppress_diff("ada@example.com", "grace@example.com"));
/// ```
pub fn suppress_diff(old: &str, new: &str) -> bool {
    if old.is_empty() {
        return old == new;
    }
    true
}

/// Resource handlers for managed Jira users.
pub struct UserResourceService {
    directory: Arc<dyn JiraUserDirectory>,
}

impl UserResourceService {
    /// Build the handlers over a directory port.
    pub fn new(directory: Arc<dyn JiraUserDirectory>) -> Self {
        Self { directory }
    }

    /// Create the user, then read it back by the id Jira assigned.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] prefixed with "request failed" when creation fails,
    /// or with "getting jira user failed" when the read-back fails.
    pub async fn create(&self, draft: &NewJiraUser) -> HandlerResult<UserResourceState> {
        let created = self
            .directory
            .create_user(draft)
            .await
            .map_err(|error| map_directory_error(REQUEST_FAILED, error))?;
        info!(account_id = %created.account_id, "created jira user");
        self.read(&created.account_id).await
    }

    /// Refresh state for the user identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] prefixed with "getting jira user failed".
    pub async fn read(&self, id: &AccountId) -> HandlerResult<UserResourceState> {
        let user = self
            .directory
            .get_user(id)
            .await
            .map_err(|error| map_directory_error(READ_FAILED, error))?;
        Ok(UserResourceState {
            id: id.clone(),
            email: user.email_address,
            display_name: user.display_name,
        })
    }

    /// Import an existing user by account id.
    ///
    /// # Errors
    ///
    /// Same as [`UserResourceService::read`].
    pub async fn import(&self, id: &AccountId) -> HandlerResult<UserResourceState> {
        self.read(id).await
    }

    /// Apply an update; always returns the state unchanged.
    pub fn update(&self, current: UserResourceState) -> UserResourceState {
        debug!(account_id = %current.id, "jira user update is a no-op");
        current
    }

    /// Delete the user identified by `id`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] prefixed with "request failed".
    pub async fn delete(&self, id: &AccountId) -> HandlerResult<()> {
        self.directory
            .delete_user(id)
            .await
            .map_err(|error| map_directory_error(REQUEST_FAILED, error))?;
        info!(account_id = %id, "deleted jira user");
        Ok(())
    }
}

fn map_directory_error(context: &str, error: JiraUserDirectoryError) -> Error {
    let message = format!("{context}: {error}");
    match error {
        JiraUserDirectoryError::Upstream { status: 404, .. } => Error::not_found(message),
        JiraUserDirectoryError::Upstream { status, .. }
            if (400..500).contains(&status) && status != 429 =>
        {
            Error::invalid_request(message)
        }
        JiraUserDirectoryError::InvalidRequest { .. } => Error::invalid_request(message),
        JiraUserDirectoryError::Decode { .. } => Error::internal(message),
        JiraUserDirectoryError::Transport { .. }
        | JiraUserDirectoryError::Timeout { .. }
        | JiraUserDirectoryError::Upstream { .. } => Error::service_unavailable(message),
    }
}
