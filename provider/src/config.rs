//! Provider configuration loaded via OrthoConfig.
//!
//! Values come from `JIRA_*` environment variables (or an OrthoConfig file);
//! lookup policy values fall back to the defaults of [`UserLookupConfig`].

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::UserLookupConfig;
use crate::outbound::jira::JiraHttpCredentials;

/// Errors raised while turning settings into adapter configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `JIRA_URL` was not provided.
    #[error("jira url is not configured (set JIRA_URL)")]
    MissingUrl,
    /// `JIRA_URL` is not an absolute http(s) URL.
    #[error("jira url {value:?} is invalid: {message}")]
    InvalidUrl {
        /// Configured value.
        value: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Only one of login and password was provided.
    #[error("jira login and password must be configured together")]
    PartialCredentials,
}

/// Configuration values for talking to one Jira site.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "JIRA")]
pub struct ProviderSettings {
    /// Jira site base URL, e.g. `https://acme.atlassian.net`.
    pub url: Option<String>,
    /// Username or account email for basic authentication.
    pub login: Option<String>,
    /// API token or password for basic authentication.
    pub password: Option<String>,
    /// Per-request HTTP timeout in seconds.
    #[ortho_config(default = 30)]
    pub timeout_secs: u64,
    /// Search attempts per lookup while no user matches.
    #[ortho_config(default = 2)]
    pub max_attempts: u32,
    /// Delay between "no match yet" attempts, in seconds.
    #[ortho_config(default = 4)]
    pub retry_delay_secs: u64,
    /// Cap on rate-limit grace extensions per lookup.
    #[ortho_config(default = 3)]
    pub grace_extensions: u32,
    /// Longest single `Retry-After` wait honoured, in seconds.
    #[ortho_config(default = 60)]
    pub wait_cap_secs: u64,
    /// Optional bound on the total time of one lookup, in seconds.
    pub deadline_secs: Option<u64>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("url", &self.url)
            .field("login", &self.login)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("grace_extensions", &self.grace_extensions)
            .field("wait_cap_secs", &self.wait_cap_secs)
            .field("deadline_secs", &self.deadline_secs)
            .finish()
    }
}

impl ProviderSettings {
    /// Parse and validate the configured Jira base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingUrl`] or [`SettingsError::InvalidUrl`].
    pub fn base_url(&self) -> Result<Url, SettingsError> {
        let raw = self
            .url
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SettingsError::MissingUrl)?;
        let url = Url::parse(raw).map_err(|error| SettingsError::InvalidUrl {
            value: raw.to_owned(),
            message: error.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidUrl {
                value: raw.to_owned(),
                message: format!("unsupported scheme {}", url.scheme()),
            });
        }
        Ok(url)
    }

    /// Basic-auth credentials, when both halves are configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::PartialCredentials`] when only one is set.
    pub fn credentials(&self) -> Result<Option<JiraHttpCredentials>, SettingsError> {
        match (&self.login, &self.password) {
            (Some(login), Some(password)) => Ok(Some(JiraHttpCredentials {
                user: login.clone(),
                api_token: password.clone(),
            })),
            (None, None) => Ok(None),
            _ => Err(SettingsError::PartialCredentials),
        }
    }

    /// Per-request HTTP timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Lookup policy derived from these settings.
    pub fn lookup_config(&self) -> UserLookupConfig {
        UserLookupConfig {
            max_attempts: self.max_attempts.max(1),
            retry_delay: Duration::from_secs(self.retry_delay_secs),
            max_grace_extensions: self.grace_extensions,
            max_retry_after: Duration::from_secs(self.wait_cap_secs),
            deadline: self.deadline_secs.map(Duration::from_secs),
        }
    }
}
