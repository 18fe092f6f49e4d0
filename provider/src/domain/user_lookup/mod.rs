//! Retrying Jira user lookup by email.
//!
//! The service owns the retry policy for the search endpoint: a fixed attempt
//! budget with a fixed delay while Jira reports no match, and rate-limit grace
//! where a 429 carrying `Retry-After` is waited out and refunded instead of
//! charged against the budget. Both the number of grace extensions and the
//! length of each wait are capped, and an optional deadline bounds the total
//! time one lookup may spend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::Clock;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    JiraUserDirectory, JiraUserDirectoryError, LookupAttempt, LookupRequest, define_port_error,
};
use crate::domain::user::JiraUser;

mod rate_limit;
mod retry_state;
mod runtime;

use rate_limit::parse_retry_after;
use retry_state::RetryState;
pub use runtime::TokioSleeper;

/// Lookup policy knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLookupConfig {
    /// Search round-trips allowed before giving up with an empty result.
    pub max_attempts: u32,
    /// Fixed delay between "no match yet" attempts.
    pub retry_delay: Duration,
    /// Maximum number of rate-limit grace extensions per lookup.
    pub max_grace_extensions: u32,
    /// Longest single `Retry-After` wait honoured; longer requests fail.
    pub max_retry_after: Duration,
    /// Optional bound on the total time spent in one lookup.
    pub deadline: Option<Duration>,
}

impl Default for UserLookupConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_delay: Duration::from_secs(4),
            max_grace_extensions: 3,
            max_retry_after: Duration::from_secs(60),
            deadline: None,
        }
    }
}

define_port_error! {
    /// Underlying reason a lookup failed.
    pub enum LookupFailure {
        /// The lookup request was rejected before any call was made.
        InvalidRequest { message: String } =>
            "invalid lookup request: {message}",
        /// No response was obtained from Jira.
        Transport { message: String } =>
            "jira unreachable: {message}",
        /// Jira answered with an error status other than a usable 429.
        Upstream { status: u16, body: String } =>
            "jira responded with status {status}: {body}",
        /// A 429 carried a `Retry-After` value that is not whole seconds.
        MalformedRateLimitHeader { value: String } =>
            "malformed Retry-After header {value:?}",
        /// Jira asked for a longer wait than the lookup is allowed to honour.
        RetryAfterTooLong { requested: Duration, limit: Duration } =>
            "Retry-After of {requested:?} exceeds the {limit:?} limit",
        /// Jira kept rate limiting after every grace extension was spent.
        RateLimitExhausted { extensions: u32 } =>
            "still rate limited after {extensions} grace extensions",
        /// A successful response did not contain a user list.
        Decode { message: String } =>
            "jira response decode failed: {message}",
        /// The lookup deadline ran out.
        DeadlineExceeded { deadline: Duration } =>
            "lookup deadline of {deadline:?} exceeded",
    }
}

/// Terminal lookup error, wrapped with caller-facing context.
///
/// The underlying [`LookupFailure`] stays reachable through
/// [`std::error::Error::source`] and [`UserLookupError::cause`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("getting jira user failed: {cause}")]
pub struct UserLookupError {
    #[source]
    cause: LookupFailure,
}

impl UserLookupError {
    /// Underlying failure.
    pub fn cause(&self) -> &LookupFailure {
        &self.cause
    }

    /// Consume the wrapper and return the underlying failure.
    pub fn into_cause(self) -> LookupFailure {
        self.cause
    }
}

impl From<LookupFailure> for UserLookupError {
    fn from(cause: LookupFailure) -> Self {
        Self { cause }
    }
}

/// Async clock-independent sleeping abstraction for lookup retries.
#[async_trait]
pub trait LookupSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    ///
    /// ```rust,no_run
    /// use async_trait::async_trait;
    /// use jira_provider::domain::LookupSleeper;
    /// use std::sync::{Arc, Mutex};
    /// use std::time::Duration;
    /// #[derive(Default)]
    /// struct CountingSleeper {
    ///     calls: Arc<Mutex<u32>>,
    /// }
    /// #[async_trait]
    /// impl LookupSleeper for CountingSleeper {
    ///     async fn sleep(&self, _duration: Duration) {
    ///         *self.calls.lock().expect("calls mutex") += 1;
    ///     }
    /// }
    /// # async fn demo() {
    /// let sleeper = CountingSleeper::default();
    /// sleeper.sleep(Duration::from_secs(4)).await;
    /// assert_eq!(*sleeper.calls.lock().expect("calls mutex"), 1);
    /// # }
    /// ```
    async fn sleep(&self, duration: Duration);
}

/// Domain-owned user lookup with bounded retries.
pub struct UserLookupService {
    directory: Arc<dyn JiraUserDirectory>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn LookupSleeper>,
    config: UserLookupConfig,
}

impl UserLookupService {
    /// Build a lookup service that sleeps on the Tokio timer.
    /// ```rust,ignore
    /// let lookup = UserLookupService::new(directory, Arc::new(DefaultClock), config);
    /// ```
    pub fn new(
        directory: Arc<dyn JiraUserDirectory>,
        clock: Arc<dyn Clock>,
        config: UserLookupConfig,
    ) -> Self {
        Self::with_sleeper(directory, clock, Arc::new(TokioSleeper), config)
    }

    /// Build a lookup service with an injected sleeper.
    /// ```rust,ignore
    /// let lookup = UserLookupService::with_sleeper(directory, clock, sleeper, config);
    /// ```
    pub fn with_sleeper(
        directory: Arc<dyn JiraUserDirectory>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn LookupSleeper>,
        config: UserLookupConfig,
    ) -> Self {
        Self {
            directory,
            clock,
            sleeper,
            config,
        }
    }

    /// Look up users matching `email`.
    ///
    /// Returns the users of the first attempt that found any, in server order.
    /// An exhausted budget is not an error: it yields an empty list.
    ///
    /// ```rust,ignore
    /// let users = lookup.lookup_user_by_email("ada@example.com").await?;
    /// if users.is_empty() {
    ///     // no matching user
    /// }
    /// # Ok::<(), jira_provider::domain::UserLookupError>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`UserLookupError`] for blank input, transport failures,
    /// non-429 error statuses, unusable or overlong rate-limit waits,
    /// undecodable bodies, and an exceeded deadline. None of these are retried.
    pub async fn lookup_user_by_email(
        &self,
        email: &str,
    ) -> Result<Vec<JiraUser>, UserLookupError> {
        let request = LookupRequest::new(email)
            .map_err(|error| LookupFailure::invalid_request(error.to_string()))?;
        let started_at = self.clock.utc();
        let mut state =
            RetryState::new(self.config.max_attempts, self.config.max_grace_extensions);

        while state.has_remaining_attempts() {
            self.check_deadline(started_at, Duration::ZERO)?;
            let attempt_number = state.begin_attempt();
            let attempt = self
                .directory
                .search_users(&request)
                .await
                .map_err(map_directory_error)?;

            if attempt.is_rate_limited() {
                let wait = rate_limit_wait(&attempt, self.config.max_retry_after)?;
                if !state.grant_grace() {
                    warn!(
                        attempt = attempt_number,
                        email = request.email(),
                        extensions = state.grace_extensions(),
                        "jira user lookup still rate limited after all grace extensions"
                    );
                    let extensions = state.grace_extensions();
                    return Err(LookupFailure::rate_limit_exhausted(extensions).into());
                }
                info!(
                    attempt = attempt_number,
                    email = request.email(),
                    wait_secs = wait.as_secs(),
                    "jira rate limited user lookup; waiting before retry"
                );
                self.pause(started_at, wait).await?;
                continue;
            }

            if !attempt.is_success() {
                return Err(LookupFailure::upstream(attempt.status, attempt.body).into());
            }

            if !attempt.users.is_empty() {
                info!(
                    attempt = attempt_number,
                    email = request.email(),
                    found = true,
                    count = attempt.users.len(),
                    "jira user lookup matched"
                );
                return Ok(attempt.users);
            }

            info!(
                attempt = attempt_number,
                email = request.email(),
                found = false,
                "jira user lookup returned no match"
            );
            if state.has_remaining_attempts() {
                self.pause(started_at, self.config.retry_delay).await?;
            }
        }

        debug!(
            email = request.email(),
            attempts = state.attempts_used(),
            rate_limited = state.rate_limit_grace_granted(),
            "jira user lookup budget exhausted without a match"
        );
        Ok(Vec::new())
    }

    async fn pause(&self, started_at: DateTime<Utc>, wait: Duration) -> Result<(), LookupFailure> {
        self.check_deadline(started_at, wait)?;
        self.sleeper.sleep(wait).await;
        Ok(())
    }

    fn check_deadline(
        &self,
        started_at: DateTime<Utc>,
        upcoming: Duration,
    ) -> Result<(), LookupFailure> {
        let Some(deadline) = self.config.deadline else {
            return Ok(());
        };
        // A clock that moved backwards counts as no time elapsed.
        let elapsed = (self.clock.utc() - started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        if elapsed.saturating_add(upcoming) > deadline {
            return Err(LookupFailure::deadline_exceeded(deadline));
        }
        Ok(())
    }
}

fn rate_limit_wait(attempt: &LookupAttempt, limit: Duration) -> Result<Duration, LookupFailure> {
    let Some(raw) = attempt.retry_after() else {
        return Err(LookupFailure::upstream(attempt.status, attempt.body.clone()));
    };
    let wait = parse_retry_after(raw).map_err(|error| {
        warn!(value = %error.value, "jira sent an unusable Retry-After header");
        LookupFailure::malformed_rate_limit_header(error.value)
    })?;
    if wait > limit {
        warn!(
            wait_secs = wait.as_secs(),
            limit_secs = limit.as_secs(),
            "jira asked for a rate-limit wait beyond the configured limit"
        );
        return Err(LookupFailure::retry_after_too_long(wait, limit));
    }
    Ok(wait)
}

fn map_directory_error(error: JiraUserDirectoryError) -> LookupFailure {
    match error {
        JiraUserDirectoryError::Transport { message }
        | JiraUserDirectoryError::Timeout { message } => LookupFailure::transport(message),
        JiraUserDirectoryError::Upstream { status, body } => LookupFailure::upstream(status, body),
        JiraUserDirectoryError::Decode { message } => LookupFailure::decode(message),
        JiraUserDirectoryError::InvalidRequest { message } => {
            LookupFailure::invalid_request(message)
        }
    }
}

#[cfg(test)]
mod tests;
