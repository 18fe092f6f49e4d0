//! Outbound adapters implementing domain ports.

pub mod jira;
