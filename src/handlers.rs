use std::{borrow::Cow, sync::Arc};

use lambda_http::{
    http::{header::CONTENT_TYPE, HeaderValue, Method, StatusCode},
    Body, Error as LambdaError, Request, RequestExt, RequestPayloadExt, Response,
};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::{
    context::AppContext,
    error::{AppError, StoreError},
    lookup::{dispatch, LookupRequest},
    review::{NewReviewPayload, Review},
    store::ReviewerScan,
};

/// Routes served by this function.
#[derive(Debug, PartialEq, Eq)]
enum Route<'a> {
    /// `GET /movies/{movieId}/reviews[/{reviewerName}]`
    Lookup {
        movie_id: &'a str,
        reviewer_name: Option<&'a str>,
    },
    /// `POST /movies/reviews`
    AddReview,
    /// `GET /movies/reviews/{reviewerName}`
    ByReviewer { reviewer_name: &'a str },
}

impl<'a> Route<'a> {
    fn resolve(method: &Method, path: &'a str) -> Option<Self> {
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();
        match (method, segments.as_slice()) {
            (&Method::POST, ["movies", "reviews"]) => Some(Route::AddReview),
            (&Method::GET, ["movies", "reviews", name]) => Some(Route::ByReviewer {
                reviewer_name: *name,
            }),
            (&Method::GET, ["movies", id, "reviews"]) => Some(Route::Lookup {
                movie_id: *id,
                reviewer_name: None,
            }),
            (&Method::GET, ["movies", id, "reviews", name]) => Some(Route::Lookup {
                movie_id: *id,
                reviewer_name: Some(*name),
            }),
            _ => None,
        }
    }
}

fn decode_segment(raw: &str) -> Cow<'_, str> {
    urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw))
}

/// Top-level request dispatcher used by the Lambda runtime.
pub async fn handle_request(
    ctx: Arc<AppContext>,
    event: Request,
) -> Result<Response<Body>, LambdaError> {
    let method = event.method().clone();
    let path = event.uri().path().to_owned();
    info!(%method, %path, query = ?event.query_string_parameters_ref(), "inbound request");

    let result = match Route::resolve(&method, &path) {
        Some(Route::Lookup {
            movie_id,
            reviewer_name,
        }) => lookup_reviews(ctx.as_ref(), &event, movie_id, reviewer_name).await,
        Some(Route::AddReview) => add_review(ctx.as_ref(), &event).await,
        Some(Route::ByReviewer { reviewer_name }) => {
            reviews_by_reviewer(ctx.as_ref(), reviewer_name).await
        }
        None => Ok(json_response(
            StatusCode::NOT_FOUND,
            json!({ "message": "Unsupported route" }),
        )),
    };

    Ok(result.unwrap_or_else(error_response))
}

async fn lookup_reviews(
    ctx: &AppContext,
    event: &Request,
    movie_id: &str,
    reviewer_name: Option<&str>,
) -> Result<Response<Body>, AppError> {
    let reviewer_name = reviewer_name.map(decode_segment);
    let query: Vec<(&str, &str)> = event
        .query_string_parameters_ref()
        .map(|params| params.iter().collect())
        .unwrap_or_default();
    let request = LookupRequest::parse(Some(movie_id), reviewer_name.as_deref(), query)?;
    let reviews = dispatch(ctx, &request).await?;
    Ok(json_response(StatusCode::OK, json!({ "data": reviews })))
}

async fn add_review(ctx: &AppContext, event: &Request) -> Result<Response<Body>, AppError> {
    let payload = event
        .payload::<NewReviewPayload>()
        .map_err(|e| {
            warn!("failed to parse review payload: {e:?}");
            AppError::InvalidPayload("invalid JSON payload".into())
        })?
        .ok_or_else(|| AppError::InvalidPayload("missing JSON payload".into()))?;
    let review = Review::from_payload(payload)?;

    ctx.store()
        .put(ctx.table_name(), review.clone().into_item())
        .await?;
    info!(
        movie_id = review.movie_id,
        reviewer_name = %review.reviewer_name,
        "stored review"
    );

    Ok(json_response(StatusCode::CREATED, &review))
}

async fn reviews_by_reviewer(
    ctx: &AppContext,
    reviewer_name: &str,
) -> Result<Response<Body>, AppError> {
    let reviewer_name = decode_segment(reviewer_name);
    if reviewer_name.trim().is_empty() {
        return Err(AppError::MissingIdentifier("Missing reviewer name".into()));
    }
    let scan = ReviewerScan {
        table_name: ctx.table_name().to_owned(),
        reviewer_name: reviewer_name.into_owned(),
    };
    let reviews = ctx
        .store()
        .scan_reviewer(&scan)
        .await?
        .iter()
        .map(Review::from_item)
        .collect::<Result<Vec<_>, StoreError>>()?;
    Ok(json_response(StatusCode::OK, json!({ "data": reviews })))
}

fn error_response(err: AppError) -> Response<Body> {
    warn!(category = err.category(), error = %err, "request failed");
    json_response(err.status(), err.body())
}

fn json_response<T: Serialize>(status: StatusCode, value: T) -> Response<Body> {
    let body = serde_json::to_string(&value).unwrap_or_else(|_| "{}".into());

    if status.is_server_error() {
        error!(
            http_status = status.as_u16(),
            body = %body,
            "returning server error response"
        );
    } else if status.is_client_error() {
        warn!(
            http_status = status.as_u16(),
            body = %body,
            "returning client error response"
        );
    }

    let mut response = Response::new(Body::Text(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
