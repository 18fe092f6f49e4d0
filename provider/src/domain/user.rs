//! Jira user data model.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors returned by the user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// Account identifier was empty.
    #[error("account id must not be empty")]
    EmptyAccountId,
    /// Account identifier contained whitespace.
    #[error("account id must not contain whitespace")]
    InvalidAccountId,
    /// Email address was empty.
    #[error("email must not be empty")]
    EmptyEmail,
    /// Display name was empty.
    #[error("display name must not be empty")]
    EmptyDisplayName,
}

/// Stable external identifier Jira assigns to every account.
///
/// # Examples
/// ```
/// use jira_provider::domain::AccountId;
///
/// let id = AccountId::new("5b10ac8d82e05b22cc7d4ef5").expect("valid id");
/// assert_eq!(id.as_ref(), "5b10ac8d82e05b22cc7d4ef5");
/// assert!(AccountId::new(" ").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Validate and construct an [`AccountId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        Self::from_owned(id.as_ref().to_owned())
    }

    fn from_owned(id: String) -> Result<Self, UserValidationError> {
        if id.is_empty() {
            return Err(UserValidationError::EmptyAccountId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(UserValidationError::InvalidAccountId);
        }
        Ok(Self(id))
    }
}

impl AsRef<str> for AccountId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

impl TryFrom<String> for AccountId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_owned(value)
    }
}

/// User record as returned by the Jira directory.
///
/// The provider only reads these records; Jira owns them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraUser {
    /// Stable account identifier.
    pub account_id: AccountId,
    /// Human readable name.
    pub display_name: String,
    /// Email address; Jira may hide it depending on profile visibility.
    pub email_address: String,
}

/// Payload for creating a new Jira user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJiraUser {
    email: String,
    display_name: String,
}

impl NewJiraUser {
    /// Validate and construct a creation payload.
    ///
    /// # Examples
    /// ```
    /// use jira_provider::domain::NewJiraUser;
    ///
    /// let draft = NewJiraUser::new("ada@example.com", "Ada").expect("valid draft");
    /// assert_eq!(draft.email(), "ada@example.com");
    /// ```
    pub fn new(
        email: impl Into<String>,
        display_name: impl Into<String>,
    ) -> Result<Self, UserValidationError> {
        let email = email.into();
        let display_name = display_name.into();
        if email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if display_name.trim().is_empty() {
            return Err(UserValidationError::EmptyDisplayName);
        }
        Ok(Self {
            email,
            display_name,
        })
    }

    /// Email address the account is created for.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Display name for the new account.
    pub fn display_name(&self) -> &str {
        self.display_name.as_str()
    }
}
