mod common;

use anyhow::Result;
use aws_sdk_dynamodb::types::AttributeValue;
use movie_reviews_api::handle_request;
use serde_json::json;

use common::{body_as_json, get, post_json, reviewer_names, setup_environment};

#[tokio::test]
async fn seeded_lookups_follow_each_strategy() -> Result<()> {
    let Some(setup) = setup_environment().await else {
        return Ok(());
    };
    let ctx = setup.ctx.clone();

    let all = handle_request(ctx.clone(), get("/movies/1234/reviews", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(all.status(), 200);
    let all_body = body_as_json(all.body());
    assert_eq!(reviewer_names(&all_body), ["Harry Human", "Joe Blogs"]);

    let again = handle_request(ctx.clone(), get("/movies/1234/reviews", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(body_as_json(again.body()), all_body);

    let by_name = handle_request(ctx.clone(), get("/movies/1234/reviews/Joe%20Blogs", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(by_name.status(), 200);
    let by_name_body = body_as_json(by_name.body());
    assert_eq!(reviewer_names(&by_name_body), ["Joe Blogs"]);
    assert_eq!(by_name_body["data"][0]["rating"], 5);

    let prefix = handle_request(ctx.clone(), get("/movies/1234/reviews/Har", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(reviewer_names(&body_as_json(prefix.body())), ["Harry Human"]);

    let unknown = handle_request(ctx.clone(), get("/movies/9999/reviews", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(unknown.status(), 200);
    assert_eq!(body_as_json(unknown.body()), json!({ "data": [] }));

    let at_least = handle_request(
        ctx.clone(),
        get("/movies/1234/reviews", &[("minRating", "3")]),
    )
    .await
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(at_least.status(), 200);
    assert_eq!(reviewer_names(&body_as_json(at_least.body())), ["Joe Blogs"]);

    let exact = handle_request(ctx.clone(), get("/movies/1234/reviews", &[("rating", "2")]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(reviewer_names(&body_as_json(exact.body())), ["Harry Human"]);

    let invalid = handle_request(
        ctx.clone(),
        get("/movies/1234/reviews", &[("minRating", "abc")]),
    )
    .await
    .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(invalid.status(), 500);
    assert!(body_as_json(invalid.body())["schema"].is_object());

    Ok(())
}

#[tokio::test]
async fn second_review_by_same_reviewer_overwrites() -> Result<()> {
    let Some(setup) = setup_environment().await else {
        return Ok(());
    };
    let ctx = setup.ctx.clone();

    let payload = json!({
        "movieId": 1234,
        "reviewerName": "Joe Blogs",
        "reviewDate": "2024-05-01",
        "content": "Changed my mind.",
        "rating": 1
    });
    let created = handle_request(ctx.clone(), post_json("/movies/reviews", &payload))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(created.status(), 201);

    let stored = setup
        .client
        .query()
        .table_name(&setup.table_name)
        .key_condition_expression("#m = :m")
        .expression_attribute_names("#m", "movieId")
        .expression_attribute_values(":m", AttributeValue::N("1234".into()))
        .send()
        .await?;
    assert_eq!(stored.count(), 2);

    let by_name = handle_request(ctx.clone(), get("/movies/1234/reviews/Joe%20Blogs", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let body = body_as_json(by_name.body());
    assert_eq!(body["data"][0]["content"], "Changed my mind.");
    assert_eq!(body["data"][0]["rating"], 1);

    let second_movie = json!({
        "movieId": 2345,
        "reviewerName": "Joe Blogs",
        "content": "Fine.",
        "rating": 3
    });
    let created = handle_request(ctx.clone(), post_json("/movies/reviews", &second_movie))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(created.status(), 201);

    let by_reviewer = handle_request(ctx.clone(), get("/movies/reviews/Joe%20Blogs", &[]))
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    assert_eq!(by_reviewer.status(), 200);
    let body = body_as_json(by_reviewer.body());
    let mut movies: Vec<i64> = body["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|review| review["movieId"].as_i64())
        .collect();
    movies.sort_unstable();
    assert_eq!(movies, [1234, 2345]);

    Ok(())
}
