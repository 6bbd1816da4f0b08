use chrono::NaiveDate;

use crate::review::Review;

fn review(
    movie_id: i64,
    reviewer_name: &str,
    date: (i32, u32, u32),
    rating: i64,
) -> Option<Review> {
    let (year, month, day) = date;
    Some(Review {
        movie_id,
        reviewer_name: reviewer_name.to_owned(),
        review_date: NaiveDate::from_ymd_opt(year, month, day)?,
        content: "Content of the review.".to_owned(),
        rating,
    })
}

/// Demo reviews loaded into fresh tables.
pub fn movie_reviews() -> Vec<Review> {
    [
        review(1234, "Joe Blogs", (2023, 10, 20), 5),
        review(1234, "Harry Human", (2022, 8, 12), 2),
    ]
    .into_iter()
    .flatten()
    .collect()
}
