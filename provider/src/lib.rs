//! Jira user provider library modules.
//!
//! The domain owns the user lookup retry policy and the resource/data-source
//! handlers; outbound adapters talk to the Jira REST API.

pub mod config;
pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::ProviderSettings;
