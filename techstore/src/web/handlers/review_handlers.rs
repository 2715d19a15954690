// techstore/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::dto::review::ReviewRequest;
use crate::errors::AppError;
use crate::models::AuthenticatedUser;
use crate::state::AppState;

const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Deserialize, Debug)]
pub struct PageQuery {
  #[serde(default)]
  pub page: u32,
  pub size: Option<u32>,
}

#[instrument(name = "handler::create_review", skip(app_state, caller, req_payload), fields(user_id = %caller.user_id))]
pub async fn create_review_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
  req_payload: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
  let review = app_state.reviews.create(&caller, &req_payload).await?;
  Ok(HttpResponse::Created().json(review))
}

#[instrument(
    name = "handler::update_review",
    skip(app_state, path, caller, req_payload),
    fields(review_id = %path.as_ref(), user_id = %caller.user_id)
)]
pub async fn update_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
  req_payload: web::Json<ReviewRequest>,
) -> Result<HttpResponse, AppError> {
  let review = app_state.reviews.update(path.into_inner(), &caller, &req_payload).await?;
  Ok(HttpResponse::Ok().json(review))
}

#[instrument(
    name = "handler::delete_review",
    skip(app_state, path, caller),
    fields(review_id = %path.as_ref(), user_id = %caller.user_id)
)]
pub async fn delete_review_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  app_state.reviews.delete(path.into_inner(), &caller).await?;
  Ok(HttpResponse::NoContent().finish())
}

#[instrument(name = "handler::product_reviews", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let reviews = app_state.reviews.product_reviews(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(reviews))
}

#[instrument(name = "handler::product_reviews_page", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn product_reviews_page_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let size = query.size.unwrap_or(DEFAULT_PAGE_SIZE);
  let page = app_state
    .reviews
    .product_reviews_page(path.into_inner(), query.page, size)
    .await?;
  Ok(HttpResponse::Ok().json(page))
}

#[instrument(name = "handler::review_summary", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn review_summary_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let summary = app_state.reviews.summary(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(summary))
}

#[instrument(name = "handler::my_reviews", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn my_reviews_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let reviews = app_state.reviews.user_reviews(caller.user_id).await?;
  Ok(HttpResponse::Ok().json(reviews))
}

#[instrument(name = "handler::user_reviews", skip(app_state, path, caller), fields(user_id = %caller.user_id))]
pub async fn user_reviews_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let reviews = app_state.reviews.reviews_of(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(reviews))
}
