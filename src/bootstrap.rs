use aws_sdk_dynamodb::{
    types::{
        AttributeDefinition, BillingMode, KeySchemaElement, KeyType, LocalSecondaryIndex,
        Projection, ProjectionType, PutRequest, ScalarAttributeType, TableStatus, WriteRequest,
    },
    Client,
};
use tokio::time::{sleep, Duration};
use tracing::info;

use crate::{
    context::ReviewTable,
    error::BootstrapError,
    review::{Review, MOVIE_ID, RATING, REVIEWER_NAME},
};

/// DynamoDB caps a batch write at 25 requests.
const BATCH_WRITE_LIMIT: usize = 25;

/// Create the reviews table and its rating index when they do not exist yet.
pub async fn ensure_reviews_table(
    client: &Client,
    table: &ReviewTable,
) -> Result<(), BootstrapError> {
    if table_exists(client, &table.table_name).await? {
        info!(table = %table.table_name, "reviews table already present");
        return Ok(());
    }

    client
        .create_table()
        .table_name(&table.table_name)
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(MOVIE_ID)
                .attribute_type(ScalarAttributeType::N)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(REVIEWER_NAME)
                .attribute_type(ScalarAttributeType::S)
                .build()?,
        )
        .attribute_definitions(
            AttributeDefinition::builder()
                .attribute_name(RATING)
                .attribute_type(ScalarAttributeType::N)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(MOVIE_ID)
                .key_type(KeyType::Hash)
                .build()?,
        )
        .key_schema(
            KeySchemaElement::builder()
                .attribute_name(REVIEWER_NAME)
                .key_type(KeyType::Range)
                .build()?,
        )
        .local_secondary_indexes(
            LocalSecondaryIndex::builder()
                .index_name(&table.rating_index)
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(MOVIE_ID)
                        .key_type(KeyType::Hash)
                        .build()?,
                )
                .key_schema(
                    KeySchemaElement::builder()
                        .attribute_name(RATING)
                        .key_type(KeyType::Range)
                        .build()?,
                )
                .projection(
                    Projection::builder()
                        .projection_type(ProjectionType::All)
                        .build(),
                )
                .build()?,
        )
        .billing_mode(BillingMode::PayPerRequest)
        .send()
        .await?;

    info!(table = %table.table_name, index = %table.rating_index, "created reviews table");
    wait_for_active(client, &table.table_name).await
}

/// Write the given reviews in batches. Existing items with the same key are overwritten.
pub async fn seed_reviews(
    client: &Client,
    table_name: &str,
    reviews: Vec<Review>,
) -> Result<(), BootstrapError> {
    let requests = reviews
        .into_iter()
        .map(|review| -> Result<WriteRequest, BootstrapError> {
            let put = PutRequest::builder()
                .set_item(Some(review.into_item()))
                .build()?;
            Ok(WriteRequest::builder().put_request(put).build())
        })
        .collect::<Result<Vec<_>, _>>()?;
    let total = requests.len();

    for chunk in requests.chunks(BATCH_WRITE_LIMIT) {
        let mut pending = Some(chunk.to_vec());
        while let Some(batch) = pending.take().filter(|b| !b.is_empty()) {
            let resp = client
                .batch_write_item()
                .request_items(table_name, batch)
                .send()
                .await?;
            pending = resp
                .unprocessed_items
                .and_then(|mut unprocessed| unprocessed.remove(table_name));
        }
    }

    info!(table = %table_name, count = total, "seeded reviews");
    Ok(())
}

async fn table_exists(client: &Client, table: &str) -> Result<bool, BootstrapError> {
    let mut last_evaluated = None;
    loop {
        let mut req = client.list_tables();
        if let Some(ref start) = last_evaluated {
            req = req.exclusive_start_table_name(start);
        }
        let resp = req.send().await?;
        if resp
            .table_names
            .as_ref()
            .unwrap_or(&vec![])
            .iter()
            .any(|name| name == table)
        {
            return Ok(true);
        }
        if let Some(next) = resp.last_evaluated_table_name {
            last_evaluated = Some(next);
        } else {
            break;
        }
    }
    Ok(false)
}

async fn wait_for_active(client: &Client, table: &str) -> Result<(), BootstrapError> {
    for _ in 0..20 {
        let resp = client.describe_table().table_name(table).send().await?;
        if resp
            .table
            .and_then(|t| t.table_status)
            .map_or(false, |status| status == TableStatus::Active)
        {
            return Ok(());
        }
        sleep(Duration::from_millis(200)).await;
    }
    Err(BootstrapError::NotActive(table.to_owned()))
}
