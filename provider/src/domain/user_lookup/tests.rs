//! Unit tests for the user lookup retry policy.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};

use super::{LookupFailure, UserLookupConfig, UserLookupService};
use crate::domain::ports::{JiraUserDirectoryError, LookupAttempt};
use crate::test_support::{
    MutableClock, RecordingSleeper, ScriptedDirectory, fixed_now, jira_user,
};

const EMAIL: &str = "ada@example.com";

struct Harness {
    directory: Arc<ScriptedDirectory>,
    sleeper: Arc<RecordingSleeper>,
    service: UserLookupService,
}

impl Harness {
    fn new(
        config: UserLookupConfig,
        scripted: Vec<Result<LookupAttempt, JiraUserDirectoryError>>,
    ) -> Self {
        let clock = Arc::new(MutableClock::new(fixed_now()));
        let directory = Arc::new(ScriptedDirectory::scripted(scripted));
        let sleeper = Arc::new(RecordingSleeper::advancing(clock.clone()));
        let service = UserLookupService::with_sleeper(
            directory.clone(),
            clock,
            sleeper.clone(),
            config,
        );
        Self {
            directory,
            sleeper,
            service,
        }
    }
}

#[fixture]
fn config() -> UserLookupConfig {
    UserLookupConfig::default()
}

fn empty() -> Result<LookupAttempt, JiraUserDirectoryError> {
    Ok(LookupAttempt::found(Vec::new()))
}

fn one_user() -> Result<LookupAttempt, JiraUserDirectoryError> {
    Ok(LookupAttempt::found(vec![jira_user("acc-1", "Ada Lovelace", EMAIL)]))
}

fn throttled(retry_after: &str) -> Result<LookupAttempt, JiraUserDirectoryError> {
    Ok(LookupAttempt::failed(429, "slow down").with_header("Retry-After", retry_after))
}

#[rstest]
#[tokio::test]
async fn first_attempt_match_returns_without_sleeping(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![one_user()]);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("lookup succeeds");

    assert_eq!(users.len(), 1);
    assert_eq!(users[0].account_id.as_ref(), "acc-1");
    assert_eq!(harness.directory.calls(), 1);
    assert!(harness.sleeper.delays().is_empty());
    assert_eq!(harness.directory.queries(), vec![EMAIL.to_owned()]);
}

#[rstest]
#[tokio::test]
async fn not_found_is_an_empty_result_every_time(config: UserLookupConfig) {
    for _ in 0..3 {
        let harness = Harness::new(config, vec![empty(), empty()]);
        let users = harness
            .service
            .lookup_user_by_email(EMAIL)
            .await
            .expect("not found is not an error");
        assert!(users.is_empty());
    }
}

#[rstest]
#[case::single(1)]
#[case::default(2)]
#[case::generous(5)]
#[tokio::test]
async fn exhausting_the_budget_issues_exactly_budget_requests(
    mut config: UserLookupConfig,
    #[case] budget: u32,
) {
    config.max_attempts = budget;
    let scripted = (0..budget).map(|_| empty()).collect();
    let harness = Harness::new(config, scripted);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("exhaustion is not an error");

    assert!(users.is_empty());
    assert_eq!(harness.directory.calls(), budget as usize);
    assert_eq!(
        harness.sleeper.delays(),
        vec![Duration::from_secs(4); budget as usize - 1],
        "the fixed delay runs between attempts only"
    );
}

#[rstest]
#[tokio::test]
async fn match_on_second_attempt_short_circuits(mut config: UserLookupConfig) {
    config.max_attempts = 3;
    let harness = Harness::new(config, vec![empty(), one_user(), empty()]);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("lookup succeeds");

    assert_eq!(users.len(), 1);
    assert_eq!(harness.directory.calls(), 2);
    assert_eq!(harness.sleeper.delays(), vec![Duration::from_secs(4)]);
}

#[rstest]
#[tokio::test]
async fn rate_limit_grace_does_not_consume_budget(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![throttled("3"), empty(), one_user()]);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("throttling is absorbed");

    assert_eq!(users.len(), 1);
    assert_eq!(harness.directory.calls(), 3);
    assert_eq!(
        harness.sleeper.delays(),
        vec![Duration::from_secs(3), Duration::from_secs(4)],
        "the 429 waits Retry-After, the empty result waits the fixed delay"
    );
}

#[rstest]
#[tokio::test]
async fn rate_limit_header_lookup_ignores_case(config: UserLookupConfig) {
    let lower = Ok(LookupAttempt::failed(429, "").with_header("retry-after", "2"));
    let harness = Harness::new(config, vec![lower, one_user()]);

    harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("lowercase header is honoured");

    assert_eq!(harness.sleeper.delays(), vec![Duration::from_secs(2)]);
}

#[rstest]
#[case::numeric("3", true)]
#[case::non_numeric("in a bit", false)]
#[case::signed("+3", false)]
#[case::lossy_bytes("\u{fffd}7", false)]
#[tokio::test]
async fn retry_after_parsing_decides_between_waiting_and_failing_fast(
    config: UserLookupConfig,
    #[case] retry_after: &str,
    #[case] succeeds: bool,
) {
    let harness = Harness::new(config, vec![throttled(retry_after), one_user()]);

    let result = harness.service.lookup_user_by_email(EMAIL).await;

    if succeeds {
        assert_eq!(result.expect("numeric header is waited out").len(), 1);
        assert_eq!(harness.directory.calls(), 2);
        assert_eq!(harness.sleeper.delays(), vec![Duration::from_secs(3)]);
    } else {
        let error = result.expect_err("malformed header fails fast");
        assert_eq!(
            error.cause(),
            &LookupFailure::MalformedRateLimitHeader {
                value: retry_after.to_owned()
            }
        );
        assert_eq!(harness.directory.calls(), 1);
        assert!(harness.sleeper.delays().is_empty(), "no zero-wait retry");
    }
}

#[rstest]
#[tokio::test]
async fn rate_limit_without_retry_after_is_an_upstream_error(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![Ok(LookupAttempt::failed(429, "quota"))]);

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("no wait hint means no retry");

    assert_eq!(
        error.into_cause(),
        LookupFailure::Upstream {
            status: 429,
            body: "quota".to_owned()
        }
    );
    assert_eq!(harness.directory.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn grace_extensions_stop_at_the_configured_cap(mut config: UserLookupConfig) {
    config.max_grace_extensions = 2;
    let harness = Harness::new(
        config,
        vec![throttled("1"), throttled("1"), throttled("1"), one_user()],
    );

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("third 429 exceeds the cap");

    assert_eq!(
        error.cause(),
        &LookupFailure::RateLimitExhausted { extensions: 2 }
    );
    assert_eq!(harness.directory.calls(), 3);
    assert_eq!(harness.sleeper.delays().len(), 2);
}

#[rstest]
#[tokio::test]
async fn transport_failure_is_terminal_on_first_attempt(config: UserLookupConfig) {
    let harness = Harness::new(
        config,
        vec![
            Err(JiraUserDirectoryError::transport("connection refused")),
            one_user(),
        ],
    );

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("transport failure surfaces");

    assert!(matches!(error.cause(), LookupFailure::Transport { .. }));
    assert!(
        error.to_string().starts_with("getting jira user failed"),
        "error is wrapped with context: {error}"
    );
    assert!(std::error::Error::source(&error).is_some());
    assert_eq!(harness.directory.calls(), 1);
    assert!(harness.sleeper.delays().is_empty());
}

#[rstest]
#[tokio::test]
async fn client_timeouts_are_transport_failures(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![Err(JiraUserDirectoryError::timeout("30s"))]);

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("timeout surfaces");

    assert!(matches!(error.cause(), LookupFailure::Transport { .. }));
}

#[rstest]
#[case::unauthorised(401)]
#[case::server_error(500)]
#[case::unavailable(503)]
#[tokio::test]
async fn other_error_statuses_are_not_retried(config: UserLookupConfig, #[case] status: u16) {
    let harness = Harness::new(
        config,
        vec![Ok(LookupAttempt::failed(status, "nope")), one_user()],
    );

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("upstream error surfaces");

    assert_eq!(
        error.into_cause(),
        LookupFailure::Upstream {
            status,
            body: "nope".to_owned()
        }
    );
    assert_eq!(harness.directory.calls(), 1);
}

#[rstest]
#[tokio::test]
async fn undecodable_success_body_is_terminal(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![Err(JiraUserDirectoryError::decode("not a list"))]);

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("decode failure surfaces");

    assert_eq!(
        error.into_cause(),
        LookupFailure::Decode {
            message: "not a list".to_owned()
        }
    );
}

#[rstest]
#[tokio::test]
async fn blank_email_is_rejected_without_calling_jira(config: UserLookupConfig) {
    let harness = Harness::new(config, vec![one_user()]);

    let error = harness
        .service
        .lookup_user_by_email("   ")
        .await
        .expect_err("blank email rejected");

    assert!(matches!(error.cause(), LookupFailure::InvalidRequest { .. }));
    assert_eq!(harness.directory.calls(), 0);
}

#[rstest]
#[tokio::test]
async fn all_matches_are_returned_in_server_order(config: UserLookupConfig) {
    let both = Ok(LookupAttempt::found(vec![
        jira_user("acc-1", "Ada", EMAIL),
        jira_user("acc-2", "Ada Other", "ada.other@example.com"),
    ]));
    let harness = Harness::new(config, vec![both]);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("lookup succeeds");

    let ids: Vec<&str> = users.iter().map(|user| user.account_id.as_ref()).collect();
    assert_eq!(ids, vec!["acc-1", "acc-2"]);
}

#[rstest]
#[tokio::test]
async fn deadline_aborts_before_an_overrunning_sleep(mut config: UserLookupConfig) {
    config.deadline = Some(Duration::from_secs(10));
    let harness = Harness::new(config, vec![throttled("8"), throttled("5"), one_user()]);

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("second wait would overrun the deadline");

    assert_eq!(
        error.cause(),
        &LookupFailure::DeadlineExceeded {
            deadline: Duration::from_secs(10)
        }
    );
    assert_eq!(harness.directory.calls(), 2);
    assert_eq!(harness.sleeper.delays(), vec![Duration::from_secs(8)]);
}

#[rstest]
#[tokio::test]
async fn deadline_leaves_fitting_lookups_alone(mut config: UserLookupConfig) {
    config.deadline = Some(Duration::from_secs(10));
    let harness = Harness::new(config, vec![throttled("3"), empty(), one_user()]);

    let users = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect("3s + 4s fits in 10s");

    assert_eq!(users.len(), 1);
}

#[rstest]
#[tokio::test]
async fn overlong_retry_after_fails_instead_of_stalling(config: UserLookupConfig) {
    let harness = Harness::new(
        config,
        vec![
            throttled("999999999"),
            throttled("999999999"),
            throttled("999999999"),
            one_user(),
        ],
    );

    let error = harness
        .service
        .lookup_user_by_email(EMAIL)
        .await
        .expect_err("a wait beyond the limit is terminal");

    assert_eq!(
        error.cause(),
        &LookupFailure::RetryAfterTooLong {
            requested: Duration::from_secs(999_999_999),
            limit: Duration::from_secs(60),
        }
    );
    assert_eq!(harness.directory.calls(), 1);
    assert!(harness.sleeper.delays().is_empty());
}

#[rstest]
#[case::at_limit("60", true)]
#[case::just_over("61", false)]
#[tokio::test]
async fn retry_after_limit_is_inclusive(
    config: UserLookupConfig,
    #[case] retry_after: &str,
    #[case] honoured: bool,
) {
    let harness = Harness::new(config, vec![throttled(retry_after), one_user()]);

    let result = harness.service.lookup_user_by_email(EMAIL).await;

    assert_eq!(result.is_ok(), honoured);
    let expected_delays = if honoured {
        vec![Duration::from_secs(60)]
    } else {
        Vec::new()
    };
    assert_eq!(harness.sleeper.delays(), expected_delays);
}
