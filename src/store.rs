//! Outbound interface to the wide-column store.
//!
//! The dispatcher only ever describes a single key-condition query; a
//! `ReviewStore` executes it and hands back raw attribute maps. Production code
//! uses [`DynamoReviewStore`], tests substitute a recording implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::{error::DisplayErrorContext, types::AttributeValue, Client};
use tracing::debug;

use crate::{error::StoreError, review::REVIEWER_NAME};

pub type Item = HashMap<String, AttributeValue>;

/// A fully bound key-condition query against the reviews table or one of its indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyConditionQuery {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: String,
    pub expression_attribute_names: HashMap<String, String>,
    pub expression_attribute_values: HashMap<String, AttributeValue>,
}

/// Full-table scan narrowed to a single reviewer.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewerScan {
    pub table_name: String,
    pub reviewer_name: String,
}

#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Run the query to exhaustion and return items in storage order.
    async fn query(&self, query: &KeyConditionQuery) -> Result<Vec<Item>, StoreError>;

    /// Insert or overwrite a single item.
    async fn put(&self, table_name: &str, item: Item) -> Result<(), StoreError>;

    async fn scan_reviewer(&self, scan: &ReviewerScan) -> Result<Vec<Item>, StoreError>;
}

/// `ReviewStore` backed by the AWS SDK DynamoDB client.
#[derive(Clone)]
pub struct DynamoReviewStore {
    client: Client,
}

impl DynamoReviewStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn dynamo_error(err: impl std::error::Error) -> StoreError {
    StoreError::Dynamo(DisplayErrorContext(err).to_string())
}

#[async_trait]
impl ReviewStore for DynamoReviewStore {
    async fn query(&self, query: &KeyConditionQuery) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut exclusive_start = None;
        loop {
            let resp = self
                .client
                .query()
                .table_name(&query.table_name)
                .set_index_name(query.index_name.clone())
                .key_condition_expression(&query.key_condition_expression)
                .set_expression_attribute_names(Some(query.expression_attribute_names.clone()))
                .set_expression_attribute_values(Some(query.expression_attribute_values.clone()))
                .set_exclusive_start_key(exclusive_start.take())
                .send()
                .await
                .map_err(dynamo_error)?;
            debug!(count = resp.count, "query page received");
            items.extend(resp.items.unwrap_or_default());
            match resp.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start = Some(key),
                _ => break,
            }
        }
        Ok(items)
    }

    async fn put(&self, table_name: &str, item: Item) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(table_name)
            .set_item(Some(item))
            .send()
            .await
            .map_err(dynamo_error)?;
        Ok(())
    }

    async fn scan_reviewer(&self, scan: &ReviewerScan) -> Result<Vec<Item>, StoreError> {
        let mut items = Vec::new();
        let mut exclusive_start = None;
        loop {
            let resp = self
                .client
                .scan()
                .table_name(&scan.table_name)
                .filter_expression("#n = :n")
                .expression_attribute_names("#n", REVIEWER_NAME)
                .expression_attribute_values(":n", AttributeValue::S(scan.reviewer_name.clone()))
                .set_exclusive_start_key(exclusive_start.take())
                .send()
                .await
                .map_err(dynamo_error)?;
            items.extend(resp.items.unwrap_or_default());
            match resp.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start = Some(key),
                _ => break,
            }
        }
        Ok(items)
    }
}
