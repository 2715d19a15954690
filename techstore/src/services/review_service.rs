// techstore/src/services/review_service.rs

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::dto::review::{ProductReviewSummary, ReviewPage, ReviewRequest, ReviewResponse};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{AuthenticatedUser, NewReview};
use crate::store::{PageRequest, ProductRepository, ReviewRepository, StorageError, Store, UserRepository};
use crate::validation;

/// Number of newest reviews embedded in a product summary.
const RECENT_REVIEWS: usize = 3;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Mean rating rounded half-up to one decimal; 0.0 for no reviews.
pub fn round_average(average: Option<f64>) -> f64 {
  average.map_or(0.0, |avg| (avg * 10.0).round() / 10.0)
}

/// Buckets 1..=5 start at zero and are overwritten from the aggregate counts.
pub fn rating_distribution(counts: &[(i32, i64)]) -> BTreeMap<i32, i64> {
  let mut distribution: BTreeMap<i32, i64> = (1..=5).map(|star| (star, 0)).collect();
  for (rating, count) in counts {
    distribution.insert(*rating, *count);
  }
  distribution
}

#[derive(Clone)]
pub struct ReviewService {
  store: Arc<dyn Store>,
}

impl ReviewService {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  #[instrument(name = "ReviewService::create", skip(self, caller, request), fields(user_id = %caller.user_id), err(Display))]
  pub async fn create(&self, caller: &AuthenticatedUser, request: &ReviewRequest) -> AppResult<ReviewResponse> {
    let valid = validation::validate_review(request, true)?;
    let product_id = valid
      .product_id
      .ok_or_else(|| AppError::Validation("productId is required".to_string()))?;

    let mut tx = self.store.begin().await?;
    if tx.find_user(caller.user_id).await?.is_none() {
      return Err(AppError::Auth("Account no longer exists".to_string()));
    }
    if tx.find_product(product_id).await?.is_none() {
      return Err(AppError::ProductNotFound(product_id));
    }
    if tx.find_review_by_author(caller.user_id, product_id).await?.is_some() {
      warn!(%product_id, "Duplicate review rejected");
      return Err(AppError::DuplicateReview);
    }
    let review = tx
      .insert_review(&NewReview {
        user_id: caller.user_id,
        product_id,
        rating: valid.rating,
        comment: valid.comment,
        // Order history is not consulted
        is_verified_purchase: false,
      })
      .await
      .map_err(|e| match e {
        StorageError::UniqueViolation(_) => AppError::DuplicateReview,
        other => AppError::Storage(other),
      })?;
    let created = tx
      .find_review(review.id)
      .await?
      .ok_or(AppError::ReviewNotFound(review.id))?;
    tx.commit().await?;
    info!(review_id = %review.id, %product_id, "Review created");
    Ok(created.into())
  }

  #[instrument(name = "ReviewService::update", skip(self, caller, request), fields(user_id = %caller.user_id), err(Display))]
  pub async fn update(
    &self,
    review_id: Uuid,
    caller: &AuthenticatedUser,
    request: &ReviewRequest,
  ) -> AppResult<ReviewResponse> {
    let valid = validation::validate_review(request, false)?;
    let mut tx = self.store.begin().await?;
    let existing = tx.find_review(review_id).await?.ok_or(AppError::ReviewNotFound(review_id))?;
    if existing.review.user_id != caller.user_id {
      return Err(AppError::Forbidden("You can only edit your own reviews".to_string()));
    }
    tx.update_review(review_id, valid.rating, valid.comment.as_deref()).await?;
    let updated = tx.find_review(review_id).await?.ok_or(AppError::ReviewNotFound(review_id))?;
    tx.commit().await?;
    Ok(updated.into())
  }

  #[instrument(name = "ReviewService::delete", skip(self, caller), fields(user_id = %caller.user_id), err(Display))]
  pub async fn delete(&self, review_id: Uuid, caller: &AuthenticatedUser) -> AppResult<()> {
    let mut tx = self.store.begin().await?;
    let existing = tx.find_review(review_id).await?.ok_or(AppError::ReviewNotFound(review_id))?;
    if existing.review.user_id != caller.user_id {
      return Err(AppError::Forbidden("You can only delete your own reviews".to_string()));
    }
    tx.delete_review(review_id).await?;
    tx.commit().await?;
    info!(%review_id, "Review deleted");
    Ok(())
  }

  pub async fn product_reviews(&self, product_id: Uuid) -> AppResult<Vec<ReviewResponse>> {
    let mut tx = self.store.begin().await?;
    let rows = tx.reviews_for_product(product_id, None).await?;
    Ok(rows.into_iter().map(ReviewResponse::from).collect())
  }

  pub async fn product_reviews_page(&self, product_id: Uuid, page: u32, size: u32) -> AppResult<ReviewPage> {
    if size == 0 || size > MAX_PAGE_SIZE {
      return Err(AppError::Validation(format!("size must be between 1 and {}", MAX_PAGE_SIZE)));
    }
    let mut tx = self.store.begin().await?;
    let total_elements = tx.count_reviews_for_product(product_id).await?;
    let rows = tx
      .reviews_for_product(product_id, Some(PageRequest { page, size }))
      .await?;
    let size_i64 = i64::from(size);
    Ok(ReviewPage {
      content: rows.into_iter().map(ReviewResponse::from).collect(),
      page,
      size,
      total_elements,
      total_pages: (total_elements + size_i64 - 1) / size_i64,
    })
  }

  #[instrument(name = "ReviewService::summary", skip(self), err(Display))]
  pub async fn summary(&self, product_id: Uuid) -> AppResult<ProductReviewSummary> {
    let mut tx = self.store.begin().await?;
    let average = tx.average_rating_for_product(product_id).await?;
    let total_reviews = tx.count_reviews_for_product(product_id).await?;
    let counts = tx.rating_counts_for_product(product_id).await?;
    let mut recent = tx.reviews_for_product(product_id, None).await?;
    recent.truncate(RECENT_REVIEWS);
    Ok(ProductReviewSummary {
      product_id,
      average_rating: round_average(average),
      total_reviews,
      rating_distribution: rating_distribution(&counts),
      recent_reviews: recent.into_iter().map(ReviewResponse::from).collect(),
    })
  }

  pub async fn user_reviews(&self, user_id: Uuid) -> AppResult<Vec<ReviewResponse>> {
    let mut tx = self.store.begin().await?;
    let rows = tx.reviews_by_user(user_id).await?;
    Ok(rows.into_iter().map(ReviewResponse::from).collect())
  }

  /// Another user's reviews are visible to admins only.
  pub async fn reviews_of(&self, caller: &AuthenticatedUser, user_id: Uuid) -> AppResult<Vec<ReviewResponse>> {
    if caller.user_id != user_id && !caller.is_admin() {
      return Err(AppError::Forbidden("You can only view your own reviews".to_string()));
    }
    self.user_reviews(user_id).await
  }
}
