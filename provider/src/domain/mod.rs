//! Domain primitives, ports, and services.
//!
//! Purpose: keep the Jira user lookup policy and the resource handlers
//! transport agnostic. Outbound adapters implement [`ports::JiraUserDirectory`];
//! the binary maps handler results onto JSON state.
//!
//! Public surface:
//! - Error (alias to `error::Error`): handler-level error payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - JiraUser / AccountId: user record returned by the directory.
//! - UserLookupService: retrying email lookup.
//! - UserResourceService / UserDataSource: resource and data-source handlers.

pub mod error;
pub mod ports;
pub mod user;
pub mod user_data_source;
pub mod user_lookup;
pub mod user_resource;

pub use self::error::{Error, ErrorCode};
pub use self::user::{AccountId, JiraUser, NewJiraUser, UserValidationError};
pub use self::user_data_source::{UserDataSource, UserDataSourceState, select_user};
pub use self::user_lookup::{
    LookupFailure, LookupSleeper, TokioSleeper, UserLookupConfig, UserLookupError,
    UserLookupService,
};
pub use self::user_resource::{UserResourceService, UserResourceState, suppress_diff};

/// Convenient handler result alias.
///
/// # Examples
/// ```
/// use jira_provider::domain::{Error, HandlerResult};
///
/// fn handler() -> HandlerResult<()> {
///     Err(Error::not_found("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type HandlerResult<T> = Result<T, Error>;
