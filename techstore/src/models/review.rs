// techstore/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Review {
  pub id: Uuid,
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub rating: i32,
  pub comment: Option<String>,
  pub is_verified_purchase: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A review joined with its author's display name.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewWithAuthor {
  #[sqlx(flatten)]
  pub review: Review,
  pub user_name: String,
}

#[derive(Debug, Clone)]
pub struct NewReview {
  pub user_id: Uuid,
  pub product_id: Uuid,
  pub rating: i32,
  pub comment: Option<String>,
  pub is_verified_purchase: bool,
}
