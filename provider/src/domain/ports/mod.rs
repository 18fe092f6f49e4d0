//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod jira_user_directory;

#[cfg(test)]
pub use jira_user_directory::MockJiraUserDirectory;
pub use jira_user_directory::{
    JiraUserDirectory, JiraUserDirectoryError, LOOKUP_MAX_RESULTS, LookupAttempt, LookupRequest,
    ResponseHeaders,
};
