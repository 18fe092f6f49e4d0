//! Test utilities for the provider crate.
//!
//! Shared doubles for unit tests (in `src/`) and integration tests (in
//! `tests/`). Only compiled for tests or with the `test-support` feature.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{
    JiraUserDirectory, JiraUserDirectoryError, LookupAttempt, LookupRequest,
};
use crate::domain::{AccountId, JiraUser, LookupSleeper, NewJiraUser};

fn lock<'a, T>(mutex: &'a Mutex<T>, name: &str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(_) => panic!("{name} mutex poisoned"),
    }
}

/// Fixed instant used as "now" by test fixtures.
pub fn fixed_now() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).single() {
        Some(now) => now,
        None => panic!("fixture timestamp must be valid"),
    }
}

/// Build a Jira user record for fixtures.
pub fn jira_user(account_id: &str, display_name: &str, email: &str) -> JiraUser {
    let account_id = match AccountId::new(account_id) {
        Ok(id) => id,
        Err(error) => panic!("fixture account id {account_id:?} invalid: {error}"),
    };
    JiraUser {
        account_id,
        display_name: display_name.to_owned(),
        email_address: email.to_owned(),
    }
}

/// Clock whose current instant only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        let delta = match TimeDelta::from_std(delta) {
            Ok(delta) => delta,
            Err(error) => {
                panic!("failed to convert Duration to TimeDelta: {error}; delta={delta:?}")
            }
        };
        *lock(&self.0, "clock") += delta;
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *lock(&self.0, "clock")
    }
}

/// Sleeper that records requested delays and returns immediately.
///
/// When built with [`RecordingSleeper::advancing`] it also moves a
/// [`MutableClock`] forward by each delay, so deadline checks observe the
/// simulated time.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
    clock: Option<Arc<MutableClock>>,
}

impl RecordingSleeper {
    /// Record delays and advance `clock` by each of them.
    pub fn advancing(clock: Arc<MutableClock>) -> Self {
        Self {
            delays: Mutex::new(Vec::new()),
            clock: Some(clock),
        }
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        lock(&self.delays, "sleeper").clone()
    }
}

#[async_trait]
impl LookupSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        lock(&self.delays, "sleeper").push(duration);
        if let Some(clock) = &self.clock {
            clock.advance(duration);
        }
    }
}

/// Directory stub replaying scripted search outcomes.
///
/// Only `search_users` is scripted; the other operations fail with an invalid
/// request so unexpected calls are visible in assertions.
pub struct ScriptedDirectory {
    scripted: Mutex<VecDeque<Result<LookupAttempt, JiraUserDirectoryError>>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl ScriptedDirectory {
    /// Replay `scripted` in order, one entry per search call.
    pub fn scripted(scripted: Vec<Result<LookupAttempt, JiraUserDirectoryError>>) -> Self {
        Self {
            scripted: Mutex::new(scripted.into()),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Number of search calls made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Emails searched for, in call order.
    pub fn queries(&self) -> Vec<String> {
        lock(&self.queries, "queries").clone()
    }
}

#[async_trait]
impl JiraUserDirectory for ScriptedDirectory {
    async fn search_users(
        &self,
        request: &LookupRequest,
    ) -> Result<LookupAttempt, JiraUserDirectoryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.queries, "queries").push(request.email().to_owned());
        lock(&self.scripted, "directory")
            .pop_front()
            .unwrap_or_else(|| {
                Err(JiraUserDirectoryError::invalid_request(
                    "search script exhausted unexpectedly",
                ))
            })
    }

    async fn get_user(&self, _account_id: &AccountId) -> Result<JiraUser, JiraUserDirectoryError> {
        Err(JiraUserDirectoryError::invalid_request("get_user is not scripted"))
    }

    async fn create_user(&self, _draft: &NewJiraUser) -> Result<JiraUser, JiraUserDirectoryError> {
        Err(JiraUserDirectoryError::invalid_request("create_user is not scripted"))
    }

    async fn delete_user(&self, _account_id: &AccountId) -> Result<(), JiraUserDirectoryError> {
        Err(JiraUserDirectoryError::invalid_request("delete_user is not scripted"))
    }
}
