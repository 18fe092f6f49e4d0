//! Wire shapes of the Jira user endpoints.

use serde::{Deserialize, Serialize};

use crate::domain::{AccountId, JiraUser, NewJiraUser};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct UserDto {
    account_id: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email_address: String,
}

impl UserDto {
    pub(super) fn into_domain(self) -> Result<JiraUser, String> {
        let account_id = AccountId::new(&self.account_id)
            .map_err(|error| format!("invalid accountId {:?}: {error}", self.account_id))?;
        Ok(JiraUser {
            account_id,
            display_name: self.display_name,
            email_address: self.email_address,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct NewUserDto<'a> {
    email_address: &'a str,
    display_name: &'a str,
}

impl<'a> From<&'a NewJiraUser> for NewUserDto<'a> {
    fn from(draft: &'a NewJiraUser) -> Self {
        Self {
            email_address: draft.email(),
            display_name: draft.display_name(),
        }
    }
}
