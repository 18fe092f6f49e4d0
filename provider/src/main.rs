//! `jira-provider` entry-point: runs one resource or data-source operation
//! against the configured Jira site and prints the resulting state as JSON.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::ffi::OsString;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use jira_provider::ProviderSettings;
use jira_provider::domain::{
    AccountId, Error, NewJiraUser, UserDataSource, UserLookupService, UserResourceService,
};
use jira_provider::outbound::jira::JiraHttpDirectory;
use mockable::DefaultClock;
use ortho_config::OrthoConfig;
use serde_json::Value;
use tokio::runtime::Builder;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

/// `jira-provider` command arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "jira-provider",
    about = "Manage Jira users declaratively and look them up by email",
    version
)]
struct CliArgs {
    #[command(subcommand)]
    operation: Operation,
}

#[derive(Debug, Clone, Subcommand)]
enum Operation {
    /// Read the user data source for an email address.
    Lookup {
        /// Email address to search for.
        #[arg(long, value_name = "email")]
        email: String,
    },
    /// Create a user and print its resource state.
    Create {
        /// Email address of the new account.
        #[arg(long, value_name = "email")]
        email: String,
        /// Display name of the new account.
        #[arg(long = "display-name", value_name = "name")]
        display_name: String,
    },
    /// Refresh resource state for an account id.
    Read {
        /// Jira account id.
        #[arg(long, value_name = "account-id")]
        id: String,
    },
    /// Import an existing account by id.
    Import {
        /// Jira account id.
        #[arg(long, value_name = "account-id")]
        id: String,
    },
    /// Delete an account by id.
    Delete {
        /// Jira account id.
        #[arg(long, value_name = "account-id")]
        id: String,
    },
}

fn main() -> ExitCode {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(io::stderr)
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let args = CliArgs::parse();
    let outcome = match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(run(args.operation)),
        Err(error) => Err(Error::internal(format!("create Tokio runtime: {error}"))),
    };

    match outcome {
        Ok(state) => match print_json(&state) {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                warn!(error = %error, "failed to write state");
                ExitCode::FAILURE
            }
        },
        Err(error) => {
            if let Err(write_error) = print_json(&error) {
                warn!(error = %write_error, "failed to write error");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(operation: Operation) -> Result<Value, Error> {
    let settings = ProviderSettings::load_from_iter([OsString::from("jira-provider")])
        .map_err(|error| Error::invalid_request(format!("load settings: {error}")))?;
    let directory = Arc::new(build_directory(&settings)?);

    match operation {
        Operation::Lookup { email } => {
            let lookup =
                UserLookupService::new(directory, Arc::new(DefaultClock), settings.lookup_config());
            let state = UserDataSource::new(lookup).read(&email).await?;
            to_value(&state)
        }
        Operation::Create {
            email,
            display_name,
        } => {
            let draft = NewJiraUser::new(email, display_name)
                .map_err(|error| Error::invalid_request(error.to_string()))?;
            let state = UserResourceService::new(directory).create(&draft).await?;
            to_value(&state)
        }
        Operation::Read { id } => {
            let state = UserResourceService::new(directory)
                .read(&parse_account_id(&id)?)
                .await?;
            to_value(&state)
        }
        Operation::Import { id } => {
            let state = UserResourceService::new(directory)
                .import(&parse_account_id(&id)?)
                .await?;
            to_value(&state)
        }
        Operation::Delete { id } => {
            let account_id = parse_account_id(&id)?;
            UserResourceService::new(directory).delete(&account_id).await?;
            Ok(serde_json::json!({ "id": account_id, "deleted": true }))
        }
    }
}

fn build_directory(settings: &ProviderSettings) -> Result<JiraHttpDirectory, Error> {
    let base = settings
        .base_url()
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let credentials = settings
        .credentials()
        .map_err(|error| Error::invalid_request(error.to_string()))?;
    let timeout = settings.request_timeout();
    let directory = match credentials {
        Some(credentials) => JiraHttpDirectory::with_credentials(base, timeout, credentials),
        None => JiraHttpDirectory::new(base, timeout),
    };
    directory.map_err(|error| Error::internal(format!("build http client: {error}")))
}

fn parse_account_id(raw: &str) -> Result<AccountId, Error> {
    AccountId::new(raw).map_err(|error| Error::invalid_request(error.to_string()))
}

fn to_value<T: serde::Serialize>(state: &T) -> Result<Value, Error> {
    serde_json::to_value(state).map_err(|error| Error::internal(format!("encode state: {error}")))
}

fn print_json<T: serde::Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value).map_err(io::Error::other)?;
    writeln!(stdout)
}
