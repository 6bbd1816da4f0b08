//! Review lookup dispatcher.
//!
//! A lookup is parsed into a [`LookupRequest`] before anything touches the
//! store. The request then selects exactly one [`LookupStrategy`], in priority
//! order:
//!
//!  1. reviewer name present: base table, `begins_with` on the sort key
//!  2. `rating` / `minRating` present: rating-ordered local secondary index
//!  3. otherwise: the whole `movieId` partition
//!
//! The strategy renders a single [`KeyConditionQuery`], and the raw items are
//! decoded into [`Review`]s in the order the store returned them.

use std::collections::{BTreeMap, HashMap};

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::info;

use crate::{
    context::{AppContext, ReviewTable},
    error::AppError,
    review::{Review, MOVIE_ID, RATING, REVIEWER_NAME},
    store::KeyConditionQuery,
};

/// Default name of the local secondary index sorted by `rating`.
pub const DEFAULT_RATING_INDEX: &str = "reviewIx";

const SCHEMA_MISMATCH: &str = "Incorrect type. Must match Query parameters schema";

/// JSON schema of the accepted query string, echoed back on rejection.
pub fn query_params_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "movieId": { "type": "string" },
            "reviewerName": { "type": "string" },
            "reviewDate": { "type": "string", "format": "date" },
            "rating": { "type": "integer" },
            "minRating": { "type": "integer" }
        },
        "additionalProperties": false
    })
}

fn invalid_shape(detail: impl std::fmt::Display) -> AppError {
    AppError::InvalidQueryShape {
        message: format!("{SCHEMA_MISMATCH}: {detail}"),
        schema: query_params_schema(),
    }
}

/// Validated `MovieReviewQueryParams`.
///
/// `movieId` and `reviewerName` are accepted for schema compatibility only;
/// the path segments are authoritative.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct QueryFilter {
    pub movie_id: Option<String>,
    pub reviewer_name: Option<String>,
    pub review_date: Option<NaiveDate>,
    pub rating: Option<i64>,
    pub min_rating: Option<i64>,
}

impl QueryFilter {
    /// Parse raw query-string pairs, rejecting anything outside the schema.
    pub fn parse<I, K, V>(params: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values: BTreeMap<String, String> = BTreeMap::new();
        for (key, value) in params {
            let (key, value) = (key.as_ref(), value.as_ref());
            if let Some(previous) = values.get(key) {
                if previous != value {
                    return Err(invalid_shape(format_args!(
                        "`{key}` must be a single value"
                    )));
                }
            }
            values.insert(key.to_owned(), value.to_owned());
        }

        let mut filter = Self::default();
        for (key, value) in values {
            match key.as_str() {
                "movieId" => filter.movie_id = Some(value),
                "reviewerName" => filter.reviewer_name = Some(value),
                "reviewDate" => {
                    let date = value
                        .trim()
                        .parse::<NaiveDate>()
                        .map_err(|_| invalid_shape("`reviewDate` must be a YYYY-MM-DD date"))?;
                    filter.review_date = Some(date);
                }
                "rating" => filter.rating = Some(parse_integer("rating", &value)?),
                "minRating" => filter.min_rating = Some(parse_integer("minRating", &value)?),
                other => {
                    return Err(invalid_shape(format_args!(
                        "unrecognized parameter `{other}`"
                    )))
                }
            }
        }
        Ok(filter)
    }

    /// The rating constraint, if any. An exact `rating` takes precedence over `minRating`.
    pub fn rating_bound(&self) -> Option<RatingBound> {
        self.rating
            .map(RatingBound::Exactly)
            .or(self.min_rating.map(RatingBound::AtLeast))
    }
}

fn parse_integer(key: &str, value: &str) -> Result<i64, AppError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid_shape(format_args!("`{key}` must be an integer")))
}

/// A lookup that has passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub movie_id: i64,
    pub reviewer_name: Option<String>,
    pub filter: QueryFilter,
}

impl LookupRequest {
    /// Build a request from the path segments and query string.
    ///
    /// The movie id is checked first, then the query string. An empty reviewer
    /// name counts as absent.
    pub fn parse<I, K, V>(
        movie_id: Option<&str>,
        reviewer_name: Option<&str>,
        query: I,
    ) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let movie_id = movie_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::MissingIdentifier("Missing movie id".into()))?
            .parse::<i64>()
            .map_err(|_| AppError::MissingIdentifier("Movie id must be numeric".into()))?;
        let filter = QueryFilter::parse(query)?;
        let reviewer_name = reviewer_name
            .filter(|name| !name.is_empty())
            .map(str::to_owned);
        Ok(Self {
            movie_id,
            reviewer_name,
            filter,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingBound {
    Exactly(i64),
    AtLeast(i64),
}

impl RatingBound {
    fn operator(&self) -> &'static str {
        match self {
            RatingBound::Exactly(_) => "=",
            RatingBound::AtLeast(_) => ">=",
        }
    }

    fn value(&self) -> i64 {
        match self {
            RatingBound::Exactly(v) | RatingBound::AtLeast(v) => *v,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupStrategy {
    ReviewerPrefix { movie_id: i64, reviewer_name: String },
    RatingIndex { movie_id: i64, bound: RatingBound },
    FullPartition { movie_id: i64 },
}

impl LookupStrategy {
    pub fn select(request: &LookupRequest) -> Self {
        let movie_id = request.movie_id;
        if let Some(reviewer_name) = &request.reviewer_name {
            return LookupStrategy::ReviewerPrefix {
                movie_id,
                reviewer_name: reviewer_name.clone(),
            };
        }
        match request.filter.rating_bound() {
            Some(bound) => LookupStrategy::RatingIndex { movie_id, bound },
            None => LookupStrategy::FullPartition { movie_id },
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LookupStrategy::ReviewerPrefix { .. } => "reviewer_prefix",
            LookupStrategy::RatingIndex { .. } => "rating_index",
            LookupStrategy::FullPartition { .. } => "full_partition",
        }
    }

    /// Render the strategy as a single key-condition query.
    pub fn key_condition(&self, table: &ReviewTable) -> KeyConditionQuery {
        let mut names = HashMap::from([("#m".to_owned(), MOVIE_ID.to_owned())]);
        let mut values: HashMap<String, AttributeValue> = HashMap::new();
        let (index_name, expression) = match self {
            LookupStrategy::ReviewerPrefix {
                movie_id,
                reviewer_name,
            } => {
                names.insert("#n".into(), REVIEWER_NAME.into());
                values.insert(":m".into(), AttributeValue::N(movie_id.to_string()));
                values.insert(":n".into(), AttributeValue::S(reviewer_name.clone()));
                (None, "#m = :m AND begins_with(#n, :n)".to_owned())
            }
            LookupStrategy::RatingIndex { movie_id, bound } => {
                names.insert("#r".into(), RATING.into());
                values.insert(":m".into(), AttributeValue::N(movie_id.to_string()));
                values.insert(":r".into(), AttributeValue::N(bound.value().to_string()));
                (
                    Some(table.rating_index.clone()),
                    format!("#m = :m AND #r {} :r", bound.operator()),
                )
            }
            LookupStrategy::FullPartition { movie_id } => {
                values.insert(":m".into(), AttributeValue::N(movie_id.to_string()));
                (None, "#m = :m".to_owned())
            }
        };
        KeyConditionQuery {
            table_name: table.table_name.clone(),
            index_name,
            key_condition_expression: expression,
            expression_attribute_names: names,
            expression_attribute_values: values,
        }
    }
}

/// Run one validated lookup against the store.
pub async fn dispatch(ctx: &AppContext, request: &LookupRequest) -> Result<Vec<Review>, AppError> {
    let strategy = LookupStrategy::select(request);
    let query = strategy.key_condition(ctx.table());
    info!(
        movie_id = request.movie_id,
        strategy = strategy.name(),
        table = %query.table_name,
        index = ?query.index_name,
        expression = %query.key_condition_expression,
        "dispatching review lookup"
    );

    let items = ctx.store().query(&query).await?;
    let reviews = items
        .iter()
        .map(Review::from_item)
        .collect::<Result<Vec<_>, _>>()?;
    info!(
        movie_id = request.movie_id,
        count = reviews.len(),
        "review lookup complete"
    );
    Ok(reviews)
}
