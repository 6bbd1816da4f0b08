use std::{
    collections::HashMap,
    env,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_dynamodb::{config::Region, Client, Config};
use lambda_http::{Body, Request, RequestExt};
use movie_reviews_api::{
    bootstrap::{ensure_reviews_table, seed_reviews},
    lookup::DEFAULT_RATING_INDEX,
    review::Review,
    seed,
    store::{DynamoReviewStore, Item, KeyConditionQuery, ReviewStore, ReviewerScan},
    AppContext, ReviewTable, StoreError,
};
use serde_json::Value;
use uuid::Uuid;

pub fn body_as_string(body: &Body) -> String {
    match body {
        Body::Text(s) => s.clone(),
        Body::Binary(b) => String::from_utf8_lossy(b).to_string(),
        Body::Empty => String::new(),
    }
}

pub fn body_as_json(body: &Body) -> Value {
    serde_json::from_str(&body_as_string(body)).expect("json body")
}

pub fn get(uri: &str, query: &[(&str, &str)]) -> Request {
    let request = lambda_http::http::Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::Empty)
        .expect("get request");
    if query.is_empty() {
        return request;
    }
    request.with_query_string_parameters(
        query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>(),
    )
}

pub fn post_json(uri: &str, payload: &Value) -> Request {
    lambda_http::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::Text(payload.to_string()))
        .expect("post request")
}

pub fn reviewer_names(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|review| review["reviewerName"].as_str().expect("name").to_string())
        .collect()
}

/// In-memory `ReviewStore` that records every call and replays canned items.
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingStore {
    items: Vec<Item>,
    failure: Option<String>,
    pub queries: Mutex<Vec<KeyConditionQuery>>,
    pub puts: Mutex<Vec<(String, Item)>>,
    pub scans: Mutex<Vec<ReviewerScan>>,
}

#[allow(dead_code)]
impl RecordingStore {
    pub fn returning(reviews: Vec<Review>) -> Self {
        Self {
            items: reviews.into_iter().map(Review::into_item).collect(),
            ..Self::default()
        }
    }

    pub fn returning_items(items: Vec<Item>) -> Self {
        Self {
            items,
            ..Self::default()
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.queries.lock().unwrap().len()
            + self.puts.lock().unwrap().len()
            + self.scans.lock().unwrap().len()
    }

    pub fn last_query(&self) -> KeyConditionQuery {
        self.queries
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("a recorded query")
    }

    fn outcome(&self) -> Result<Vec<Item>, StoreError> {
        match &self.failure {
            Some(message) => Err(StoreError::Dynamo(message.clone())),
            None => Ok(self.items.clone()),
        }
    }
}

#[async_trait]
impl ReviewStore for RecordingStore {
    async fn query(&self, query: &KeyConditionQuery) -> Result<Vec<Item>, StoreError> {
        self.queries.lock().unwrap().push(query.clone());
        self.outcome()
    }

    async fn put(&self, table_name: &str, item: Item) -> Result<(), StoreError> {
        self.puts
            .lock()
            .unwrap()
            .push((table_name.to_string(), item));
        self.outcome().map(|_| ())
    }

    async fn scan_reviewer(&self, scan: &ReviewerScan) -> Result<Vec<Item>, StoreError> {
        self.scans.lock().unwrap().push(scan.clone());
        self.outcome()
    }
}

#[allow(dead_code)]
pub const RECORDING_TABLE: &str = "MovieReviews_Recording";

#[allow(dead_code)]
pub fn recording_context(store: Arc<RecordingStore>) -> Arc<AppContext> {
    Arc::new(AppContext::new(
        store,
        ReviewTable::new(RECORDING_TABLE, DEFAULT_RATING_INDEX),
    ))
}

#[allow(dead_code)]
pub struct TestSetup {
    pub ctx: Arc<AppContext>,
    pub client: Client,
    pub table_name: String,
    _guard: TableGuard,
}

#[allow(dead_code)]
struct TableGuard {
    client: Client,
    table_name: String,
}

impl Drop for TableGuard {
    fn drop(&mut self) {
        let client = self.client.clone();
        let table_name = self.table_name.clone();
        tokio::spawn(async move {
            let _ = client.delete_table().table_name(&table_name).send().await;
        });
    }
}

/// Connect to DynamoDB Local, create a fresh seeded reviews table, and build a context for it.
///
/// Returns `None` when no DynamoDB endpoint is reachable so the calling test can skip.
#[allow(dead_code)]
pub async fn setup_environment() -> Option<TestSetup> {
    let endpoint =
        env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:8000".to_string());
    let region = Region::new(env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()));
    let config = Config::builder()
        .endpoint_url(endpoint)
        .region(region)
        .credentials_provider(Credentials::for_tests())
        .behavior_version_latest()
        .build();
    let client = Client::from_conf(config);

    if client.list_tables().send().await.is_err() {
        eprintln!("skipping integration test: DynamoDB not reachable");
        return None;
    }

    let table_name = format!("MovieReviews_IntegrationTest_{}", Uuid::new_v4().simple());
    let table = ReviewTable::new(table_name.clone(), DEFAULT_RATING_INDEX);
    create_seeded_table(&client, &table).await.ok()?;
    let guard = TableGuard {
        client: client.clone(),
        table_name: table_name.clone(),
    };

    let ctx = Arc::new(AppContext::new(
        Arc::new(DynamoReviewStore::new(client.clone())),
        table,
    ));

    Some(TestSetup {
        ctx,
        client,
        table_name,
        _guard: guard,
    })
}

#[allow(dead_code)]
async fn create_seeded_table(client: &Client, table: &ReviewTable) -> Result<()> {
    ensure_reviews_table(client, table).await?;
    seed_reviews(client, &table.table_name, seed::movie_reviews()).await?;
    Ok(())
}
