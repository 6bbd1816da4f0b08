//! Process configuration, read once at cold start.
//!
//! The deployment environment is resolved in this order:
//!  1. explicit `ENVIRONMENT_NAME`
//!  2. local tooling hints (`cargo lambda watch`, SAM local, LocalStack)
//!  3. AWS Lambda runtime variables
//!  4. `Local`

use std::{env, fmt, time::Duration};

use crate::{context::ReviewTable, lookup::DEFAULT_RATING_INDEX};

const ENVIRONMENT_NAME_ENV: &str = "ENVIRONMENT_NAME";
const TABLE_NAME_ENV: &str = "TABLE_NAME";
const REVIEW_INDEX_NAME_ENV: &str = "REVIEW_INDEX_NAME";
const STORE_TIMEOUT_MS_ENV: &str = "STORE_TIMEOUT_MS";
const BOOTSTRAP_TABLES_ENV: &str = "BOOTSTRAP_DYNAMODB_TABLES";
const SEED_TABLES_ENV: &str = "SEED_DYNAMODB_TABLES";

const REMOTE_ENVIRONMENT: &str = "Prod";
const LOCAL_ENVIRONMENT: &str = "Local";
const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_millis(5_000);

const LOCAL_HINTS: [&str; 3] = ["AWS_SAM_LOCAL", "CARGO_LAMBDA_HTTP_PORT", "LOCALSTACK_HOSTNAME"];
const AWS_HINTS: [&str; 4] = [
    "AWS_EXECUTION_ENV",
    "AWS_REGION",
    "AWS_LAMBDA_FUNCTION_NAME",
    "LAMBDA_TASK_ROOT",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    ExplicitVar,
    LocalTooling,
    AwsRuntime,
    DefaultLocal,
}

impl fmt::Display for ResolutionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolutionSource::ExplicitVar => write!(f, "explicit ENVIRONMENT_NAME"),
            ResolutionSource::LocalTooling => write!(f, "local tooling auto-detect"),
            ResolutionSource::AwsRuntime => write!(f, "AWS runtime auto-detect"),
            ResolutionSource::DefaultLocal => write!(f, "fallback to Local"),
        }
    }
}

/// Named deployment environment (Prod, Staging, Local, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentEnv {
    name: String,
    source: ResolutionSource,
}

impl DeploymentEnv {
    pub fn detect() -> Self {
        if let Some(name) = non_empty_var(ENVIRONMENT_NAME_ENV) {
            return Self::named(name, ResolutionSource::ExplicitVar);
        }
        if LOCAL_HINTS.iter().any(|key| env::var_os(key).is_some()) {
            return Self::named(LOCAL_ENVIRONMENT, ResolutionSource::LocalTooling);
        }
        if AWS_HINTS.iter().any(|key| env::var_os(key).is_some()) {
            return Self::named(REMOTE_ENVIRONMENT, ResolutionSource::AwsRuntime);
        }
        Self::named(LOCAL_ENVIRONMENT, ResolutionSource::DefaultLocal)
    }

    fn named(name: impl Into<String>, source: ResolutionSource) -> Self {
        Self {
            name: name.into(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> ResolutionSource {
        self.source
    }

    pub fn is_local(&self) -> bool {
        self.name.eq_ignore_ascii_case(LOCAL_ENVIRONMENT)
    }

    /// Default reviews table for this environment, e.g. `MovieReviews_Prod`.
    pub fn table_name(&self) -> String {
        format!("MovieReviews_{}", self.name)
    }
}

/// Everything the Lambda binary needs before serving its first request.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: DeploymentEnv,
    pub table: ReviewTable,
    pub store_timeout: Duration,
    pub bootstrap_tables: bool,
    pub seed_tables: bool,
}

impl ServiceConfig {
    pub fn from_env() -> Self {
        let environment = DeploymentEnv::detect();
        let table = ReviewTable::new(
            non_empty_var(TABLE_NAME_ENV).unwrap_or_else(|| environment.table_name()),
            non_empty_var(REVIEW_INDEX_NAME_ENV).unwrap_or_else(|| DEFAULT_RATING_INDEX.into()),
        );
        let store_timeout = non_empty_var(STORE_TIMEOUT_MS_ENV)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_STORE_TIMEOUT);
        let bootstrap_tables = flag(BOOTSTRAP_TABLES_ENV).unwrap_or_else(|| environment.is_local());
        let seed_tables = flag(SEED_TABLES_ENV).unwrap_or(bootstrap_tables);
        Self {
            environment,
            table,
            store_timeout,
            bootstrap_tables,
            seed_tables,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn flag(key: &str) -> Option<bool> {
    non_empty_var(key).map(|value| {
        matches!(
            value.to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}
