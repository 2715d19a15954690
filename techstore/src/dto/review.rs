// techstore/src/dto/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::models::ReviewWithAuthor;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
  pub product_id: Option<Uuid>,
  pub rating: Option<i32>,
  pub comment: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
  pub id: Uuid,
  pub product_id: Uuid,
  pub user_name: String,
  pub rating: i32,
  pub comment: Option<String>,
  pub is_verified_purchase: bool,
  pub created_at: DateTime<Utc>,
}

impl From<ReviewWithAuthor> for ReviewResponse {
  fn from(row: ReviewWithAuthor) -> Self {
    Self {
      id: row.review.id,
      product_id: row.review.product_id,
      user_name: row.user_name,
      rating: row.review.rating,
      comment: row.review.comment,
      is_verified_purchase: row.review.is_verified_purchase,
      created_at: row.review.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductReviewSummary {
  pub product_id: Uuid,
  /// Mean rating to one decimal, 0.0 when there are no reviews.
  pub average_rating: f64,
  pub total_reviews: i64,
  /// Always holds keys 1 through 5.
  pub rating_distribution: BTreeMap<i32, i64>,
  pub recent_reviews: Vec<ReviewResponse>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewPage {
  pub content: Vec<ReviewResponse>,
  pub page: u32,
  pub size: u32,
  pub total_elements: i64,
  pub total_pages: i64,
}
