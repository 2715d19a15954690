// techstore/tests/reviews.rs

mod common;

use common::*;
use techstore::dto::review::ReviewRequest;
use techstore::errors::AppError;
use techstore::models::{AuthenticatedUser, OrderStatus, Role};
use uuid::Uuid;

fn review(product_id: Uuid, rating: i32, comment: &str) -> ReviewRequest {
  ReviewRequest {
    product_id: Some(product_id),
    rating: Some(rating),
    comment: Some(comment.to_string()),
  }
}

#[tokio::test]
async fn second_review_for_same_product_is_rejected() {
  let app = build_app();
  let author = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let created = app.state.reviews.create(&author, &review(mouse.id, 5, "Great")).await.unwrap();
  assert_eq!(created.user_name, "Juan Pérez");
  assert!(!created.is_verified_purchase);

  let err = app
    .state
    .reviews
    .create(&author, &review(mouse.id, 4, "Still great"))
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::DuplicateReview));
  assert_eq!(app.state.reviews.product_reviews(mouse.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn review_of_unknown_product_is_not_found() {
  let app = build_app();
  let author = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let err = app
    .state
    .reviews
    .create(&author, &review(Uuid::new_v4(), 5, "?"))
    .await
    .unwrap_err();
  assert!(matches!(err, AppError::ProductNotFound(_)));
}

#[tokio::test]
async fn only_the_author_can_edit_or_delete() {
  let app = build_app();
  let author = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let intruder = register(&app.state, "María García", "maria@test.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let created = app.state.reviews.create(&author, &review(mouse.id, 3, "Okay")).await.unwrap();

  let update = ReviewRequest {
    product_id: None,
    rating: Some(1),
    comment: Some("Changed".to_string()),
  };
  assert!(matches!(
    app.state.reviews.update(created.id, &intruder, &update).await,
    Err(AppError::Forbidden(_))
  ));
  assert!(matches!(
    app.state.reviews.delete(created.id, &intruder).await,
    Err(AppError::Forbidden(_))
  ));

  let updated = app.state.reviews.update(created.id, &author, &update).await.unwrap();
  assert_eq!(updated.rating, 1);
  assert_eq!(updated.comment.as_deref(), Some("Changed"));

  app.state.reviews.delete(created.id, &author).await.unwrap();
  assert!(matches!(
    app.state.reviews.delete(created.id, &author).await,
    Err(AppError::ReviewNotFound(_))
  ));
}

#[tokio::test]
async fn summary_rounds_average_and_fills_every_bucket() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  for (idx, rating) in [5, 5, 4, 3].into_iter().enumerate() {
    let reviewer = register(&app.state, &format!("Reviewer {idx}"), &format!("reviewer{idx}@test.com")).await;
    app
      .state
      .reviews
      .create(&reviewer, &review(mouse.id, rating, "ok"))
      .await
      .unwrap();
  }

  let summary = app.state.reviews.summary(mouse.id).await.unwrap();
  assert_eq!(summary.average_rating, 4.3);
  assert_eq!(summary.total_reviews, 4);
  let distribution: Vec<(i32, i64)> = summary.rating_distribution.into_iter().collect();
  assert_eq!(distribution, vec![(1, 0), (2, 0), (3, 1), (4, 1), (5, 2)]);
  assert_eq!(summary.recent_reviews.len(), 3);
  // Newest first
  assert_eq!(summary.recent_reviews[0].rating, 3);
}

#[tokio::test]
async fn summary_of_unreviewed_product_is_empty() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let summary = app.state.reviews.summary(mouse.id).await.unwrap();
  assert_eq!(summary.average_rating, 0.0);
  assert_eq!(summary.total_reviews, 0);
  assert_eq!(summary.rating_distribution.len(), 5);
  assert!(summary.rating_distribution.values().all(|count| *count == 0));
}

#[tokio::test]
async fn confirmed_purchase_does_not_mark_review_verified() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let order = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 1, "10.00")], "PAYPAL"))
    .await
    .unwrap();
  assert_eq!(order.status, OrderStatus::Confirmed);

  let created = app.state.reviews.create(&buyer, &review(mouse.id, 5, "Bought it")).await.unwrap();
  assert!(!created.is_verified_purchase);
  let listed = app.state.reviews.product_reviews(mouse.id).await.unwrap();
  assert!(listed.iter().all(|r| !r.is_verified_purchase));
}

#[tokio::test]
async fn pages_report_totals() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  for idx in 0..3 {
    let reviewer = register(&app.state, &format!("Reviewer {idx}"), &format!("reviewer{idx}@test.com")).await;
    app.state.reviews.create(&reviewer, &review(mouse.id, 4, "ok")).await.unwrap();
  }

  let page = app.state.reviews.product_reviews_page(mouse.id, 1, 2).await.unwrap();
  assert_eq!(page.content.len(), 1);
  assert_eq!(page.total_elements, 3);
  assert_eq!(page.total_pages, 2);
  assert!(matches!(
    app.state.reviews.product_reviews_page(mouse.id, 0, 0).await,
    Err(AppError::Validation(_))
  ));
}

#[tokio::test]
async fn other_users_reviews_need_admin() {
  let app = build_app();
  let author = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let other = register(&app.state, "María García", "maria@test.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  app.state.reviews.create(&author, &review(mouse.id, 4, "ok")).await.unwrap();

  assert_eq!(app.state.reviews.reviews_of(&author, author.user_id).await.unwrap().len(), 1);
  assert!(matches!(
    app.state.reviews.reviews_of(&other, author.user_id).await,
    Err(AppError::Forbidden(_))
  ));

  let admin = AuthenticatedUser {
    user_id: Uuid::new_v4(),
    email: "admin@techstore.com".to_string(),
    role: Role::Admin,
  };
  assert_eq!(app.state.reviews.reviews_of(&admin, author.user_id).await.unwrap().len(), 1);
}
