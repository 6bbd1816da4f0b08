use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, StoreError};

pub const MOVIE_ID: &str = "movieId";
pub const REVIEWER_NAME: &str = "reviewerName";
pub const REVIEW_DATE: &str = "reviewDate";
pub const CONTENT: &str = "content";
pub const RATING: &str = "rating";

/// Highest rating accepted by the write path.
pub const MAX_RATING: i64 = 5;

/// A movie review keyed by (`movieId`, `reviewerName`).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Review {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    #[serde(rename = "reviewerName")]
    pub reviewer_name: String,
    #[serde(rename = "reviewDate")]
    pub review_date: NaiveDate,
    pub content: String,
    pub rating: i64,
}

/// Incoming payload for `POST /movies/reviews`.
#[derive(Debug, Deserialize)]
pub struct NewReviewPayload {
    #[serde(rename = "movieId")]
    pub movie_id: i64,
    #[serde(rename = "reviewerName")]
    pub reviewer_name: String,
    #[serde(rename = "reviewDate")]
    pub review_date: Option<NaiveDate>,
    pub content: String,
    pub rating: i64,
}

impl Review {
    /// Validate a write payload, stamping today's date when none is given.
    pub fn from_payload(payload: NewReviewPayload) -> Result<Self, AppError> {
        let reviewer_name = payload.reviewer_name.trim().to_owned();
        if reviewer_name.is_empty() {
            return Err(AppError::InvalidPayload("reviewerName must not be empty".into()));
        }
        if !(0..=MAX_RATING).contains(&payload.rating) {
            return Err(AppError::InvalidPayload(format!(
                "rating must be between 0 and {MAX_RATING}, got {}",
                payload.rating
            )));
        }
        Ok(Self {
            movie_id: payload.movie_id,
            reviewer_name,
            review_date: payload
                .review_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            content: payload.content,
            rating: payload.rating,
        })
    }

    /// Convert the review into a DynamoDB attribute map.
    pub fn into_item(self) -> HashMap<String, AttributeValue> {
        let mut map = HashMap::new();
        map.insert(MOVIE_ID.into(), AttributeValue::N(self.movie_id.to_string()));
        map.insert(REVIEWER_NAME.into(), AttributeValue::S(self.reviewer_name));
        map.insert(
            REVIEW_DATE.into(),
            AttributeValue::S(self.review_date.format("%Y-%m-%d").to_string()),
        );
        map.insert(CONTENT.into(), AttributeValue::S(self.content));
        map.insert(RATING.into(), AttributeValue::N(self.rating.to_string()));
        map
    }

    /// Rehydrate a review from a DynamoDB attribute map.
    pub fn from_item(item: &HashMap<String, AttributeValue>) -> Result<Self, StoreError> {
        let get_str = |key: &str| -> Result<String, StoreError> {
            item.get(key)
                .and_then(|v| v.as_s().ok())
                .map(|s| s.to_string())
                .ok_or_else(|| StoreError::Malformed(format!("missing attribute `{key}`")))
        };
        let get_num = |key: &str| -> Result<i64, StoreError> {
            item.get(key)
                .and_then(|v| v.as_n().ok())
                .and_then(|n| n.parse::<i64>().ok())
                .ok_or_else(|| StoreError::Malformed(format!("missing numeric attribute `{key}`")))
        };
        let review_date = get_str(REVIEW_DATE)?
            .parse::<NaiveDate>()
            .map_err(|_| StoreError::Malformed("invalid reviewDate".into()))?;
        Ok(Self {
            movie_id: get_num(MOVIE_ID)?,
            reviewer_name: get_str(REVIEWER_NAME)?,
            review_date,
            content: get_str(CONTENT)?,
            rating: get_num(RATING)?,
        })
    }
}
