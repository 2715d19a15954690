// techstore/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::AuthenticatedUser;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  #[serde(default)]
  pub query: String,
}

#[derive(Deserialize, Debug)]
pub struct AvailabilityQuery {
  pub quantity: i32,
}

#[derive(Deserialize, Debug)]
pub struct RestockPayload {
  pub quantity: i32,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.list_products().await?;
  info!("Fetched {} products.", products.len());
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.catalog.get_product(path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(product))
}

#[instrument(name = "handler::search_products", skip(app_state))]
pub async fn search_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.search(&query.query).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::products_by_category", skip(app_state))]
pub async fn products_by_category_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let products = app_state.catalog.products_in_category(&path).await?;
  Ok(HttpResponse::Ok().json(products))
}

#[instrument(name = "handler::categories", skip(app_state))]
pub async fn categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.catalog.categories().await?))
}

#[instrument(name = "handler::low_stock", skip(app_state))]
pub async fn low_stock_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.catalog.low_stock().await?))
}

#[instrument(name = "handler::out_of_stock", skip(app_state))]
pub async fn out_of_stock_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  Ok(HttpResponse::Ok().json(app_state.catalog.out_of_stock().await?))
}

#[instrument(name = "handler::availability", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn availability_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  query: web::Query<AvailabilityQuery>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let available = app_state.catalog.has_enough_stock(product_id, query.quantity).await?;
  Ok(HttpResponse::Ok().json(json!({
      "productId": product_id,
      "quantity": query.quantity,
      "available": available
  })))
}

#[instrument(
    name = "handler::restock",
    skip(app_state, path, caller, payload),
    fields(product_id = %path.as_ref(), user_id = %caller.user_id)
)]
pub async fn restock_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
  payload: web::Json<RestockPayload>,
) -> Result<HttpResponse, AppError> {
  if !caller.is_admin() {
    return Err(AppError::Forbidden("Only administrators can restock products".to_string()));
  }
  let product = app_state.catalog.increase_stock(path.into_inner(), payload.quantity).await?;
  info!(stock = product.stock, "Product restocked");
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "product": product
  })))
}
