//! Lambda entrypoint.
//!
//! Initialises logging, reads the service configuration, optionally creates and
//! seeds the reviews table (local runs), then hands execution to `lambda_http`.
//! The `AppContext` is built once so the DynamoDB client is reused across
//! invocations.

use std::sync::Arc;

use aws_config::{timeout::TimeoutConfig, BehaviorVersion};
use aws_sdk_dynamodb::Client;
use lambda_http::{run, service_fn, Error as LambdaError};
use movie_reviews_api::{
    bootstrap::{ensure_reviews_table, seed_reviews},
    config::ServiceConfig,
    handle_request, lambda_error, seed,
    store::DynamoReviewStore,
    AppContext,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_level(true)
        .json()
        .with_current_span(false)
        .init();

    let config = ServiceConfig::from_env();
    info!(
        environment = config.environment.name(),
        table_name = %config.table.table_name,
        rating_index = %config.table.rating_index,
        resolution = %config.environment.source(),
        store_timeout_ms = config.store_timeout.as_millis() as u64,
        "initialising Lambda runtime"
    );

    let sdk_config = aws_config::defaults(BehaviorVersion::latest())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.store_timeout)
                .build(),
        )
        .load()
        .await;
    let client = Client::new(&sdk_config);

    if config.bootstrap_tables {
        ensure_reviews_table(&client, &config.table)
            .await
            .map_err(lambda_error)?;
    } else {
        info!(
            environment = config.environment.name(),
            "skipping DynamoDB table bootstrap"
        );
    }
    if config.seed_tables {
        seed_reviews(&client, &config.table.table_name, seed::movie_reviews())
            .await
            .map_err(lambda_error)?;
    }

    let ctx = Arc::new(AppContext::new(
        Arc::new(DynamoReviewStore::new(client)),
        config.table,
    ));

    run(service_fn(move |event| {
        let ctx = ctx.clone();
        async move { handle_request(ctx, event).await }
    }))
    .await
}
