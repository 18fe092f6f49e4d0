//! Jira outbound adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `JiraUserDirectory` port against the Jira REST API v2.

mod dto;
mod http_directory;

pub use http_directory::{JiraHttpCredentials, JiraHttpDirectory};
