//! Reqwest-backed Jira user directory adapter.
//!
//! This adapter owns transport details only: URL construction, basic
//! authentication, timeout and HTTP error mapping, and JSON decoding into
//! domain users. Retry decisions stay in the domain.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::debug;

use super::dto::{NewUserDto, UserDto};
use crate::domain::ports::{
    JiraUserDirectory, JiraUserDirectoryError, LookupAttempt, LookupRequest, ResponseHeaders,
};
use crate::domain::{AccountId, JiraUser, NewJiraUser};

const USER_PATH: &str = "rest/api/2/user";
const USER_SEARCH_PATH: &str = "rest/api/2/user/search";
const DEFAULT_USER_AGENT: &str = "jira-provider/0.1";

/// Basic-auth credentials for Jira (account email or username plus API token).
pub struct JiraHttpCredentials {
    /// Username or account email.
    pub user: String,
    /// API token or password.
    pub api_token: String,
}

/// Jira directory adapter that talks to one Jira site.
pub struct JiraHttpDirectory {
    client: Client,
    base: Url,
    credentials: Option<JiraHttpCredentials>,
}

impl JiraHttpDirectory {
    /// Build an unauthenticated adapter with an explicit request timeout.
    /// ```rust,ignore
    /// let directory = JiraHttpDirectory::new(base, timeout)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Self::build(base, timeout, None)
    }

    /// Build an adapter that authenticates every request.
    /// ```rust,ignore
    /// let directory = JiraHttpDirectory::with_credentials(base, timeout, credentials)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn with_credentials(
        base: Url,
        timeout: Duration,
        credentials: JiraHttpCredentials,
    ) -> Result<Self, reqwest::Error> {
        Self::build(base, timeout, Some(credentials))
    }

    fn build(
        base: Url,
        timeout: Duration,
        credentials: Option<JiraHttpCredentials>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base: with_trailing_slash(base),
            credentials,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, JiraUserDirectoryError> {
        self.base.join(path).map_err(|error| {
            JiraUserDirectoryError::invalid_request(format!("cannot build {path} url: {error}"))
        })
    }

    fn account_endpoint(&self, account_id: &AccountId) -> Result<Url, JiraUserDirectoryError> {
        let mut url = self.endpoint(USER_PATH)?;
        url.query_pairs_mut()
            .append_pair("accountId", account_id.as_ref());
        Ok(url)
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        let builder = builder.header(reqwest::header::ACCEPT, "application/json");
        match &self.credentials {
            Some(credentials) => {
                builder.basic_auth(&credentials.user, Some(&credentials.api_token))
            }
            None => builder,
        }
    }
}

#[async_trait]
impl JiraUserDirectory for JiraHttpDirectory {
    async fn search_users(
        &self,
        request: &LookupRequest,
    ) -> Result<LookupAttempt, JiraUserDirectoryError> {
        let mut url = self.endpoint(USER_SEARCH_PATH)?;
        url.query_pairs_mut()
            .append_pair("query", request.email())
            .append_pair("maxResults", &request.max_results().to_string());

        let response = self
            .authorised(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await.map_err(map_transport_error)?;
        debug!(status = status.as_u16(), "jira user search responded");

        let users = if status.is_success() {
            parse_users(body.as_ref())?
        } else {
            Vec::new()
        };
        Ok(LookupAttempt {
            status: status.as_u16(),
            headers,
            users,
            body: body_preview(body.as_ref()),
        })
    }

    async fn get_user(&self, account_id: &AccountId) -> Result<JiraUser, JiraUserDirectoryError> {
        let url = self.account_endpoint(account_id)?;
        let response = self
            .authorised(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        parse_user(body.as_ref())
    }

    async fn create_user(&self, draft: &NewJiraUser) -> Result<JiraUser, JiraUserDirectoryError> {
        let url = self.endpoint(USER_PATH)?;
        let response = self
            .authorised(self.client.post(url))
            .json(&NewUserDto::from(draft))
            .send()
            .await
            .map_err(map_transport_error)?;
        let body = success_body(response).await?;
        parse_user(body.as_ref())
    }

    async fn delete_user(&self, account_id: &AccountId) -> Result<(), JiraUserDirectoryError> {
        let url = self.account_endpoint(account_id)?;
        let response = self
            .authorised(self.client.delete(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        success_body(response).await?;
        Ok(())
    }
}

fn with_trailing_slash(mut base: Url) -> Url {
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base
}

// Non-UTF-8 values are kept lossily so the domain can reject them.
fn collect_headers(headers: &HeaderMap) -> ResponseHeaders {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}

async fn success_body(response: Response) -> Result<Vec<u8>, JiraUserDirectoryError> {
    let status = response.status();
    let body = response.bytes().await.map_err(map_transport_error)?;
    if !status.is_success() {
        return Err(map_status_error(status, body.as_ref()));
    }
    Ok(body.to_vec())
}

fn parse_users(body: &[u8]) -> Result<Vec<JiraUser>, JiraUserDirectoryError> {
    let decoded: Vec<UserDto> = serde_json::from_slice(body).map_err(|error| {
        JiraUserDirectoryError::decode(format!("invalid user search payload: {error}"))
    })?;
    decoded
        .into_iter()
        .map(UserDto::into_domain)
        .collect::<Result<Vec<_>, _>>()
        .map_err(JiraUserDirectoryError::decode)
}

fn parse_user(body: &[u8]) -> Result<JiraUser, JiraUserDirectoryError> {
    let decoded: UserDto = serde_json::from_slice(body).map_err(|error| {
        JiraUserDirectoryError::decode(format!("invalid user payload: {error}"))
    })?;
    decoded.into_domain().map_err(JiraUserDirectoryError::decode)
}

fn map_transport_error(error: reqwest::Error) -> JiraUserDirectoryError {
    if error.is_timeout() {
        JiraUserDirectoryError::timeout(error.to_string())
    } else {
        JiraUserDirectoryError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> JiraUserDirectoryError {
    JiraUserDirectoryError::upstream(status.as_u16(), body_preview(body))
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
