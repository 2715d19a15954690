// techstore/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;
use uuid::Uuid;

use crate::dto::order::CheckoutRequest;
use crate::errors::AppError;
use crate::models::AuthenticatedUser;
use crate::state::AppState;
use crate::validation::validate_checkout;

/// Validation failures never reach the pipeline. A declined payment still answers 200
/// with the cancelled order in the body.
#[instrument(name = "handler::checkout", skip(app_state, caller, req_payload), fields(user_id = %caller.user_id))]
pub async fn checkout_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
  req_payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let command = validate_checkout(req_payload.into_inner())?;
  let order = app_state.orders.create_order(&caller, command).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "message": "Order created successfully",
      "order": order
  })))
}

#[instrument(name = "handler::list_orders", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.orders_for_user(&caller).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::user_orders", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn user_orders_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.orders_for_user(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "orders": orders
  })))
}

#[instrument(
    name = "handler::get_order",
    skip(app_state, path, caller),
    fields(order_id = %path.as_ref(), user_id = %caller.user_id)
)]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.get_order(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
    name = "handler::cancel_order",
    skip(app_state, path, caller),
    fields(order_id = %path.as_ref(), user_id = %caller.user_id)
)]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let order = app_state.orders.cancel_order(&caller, path.into_inner()).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "order": order
  })))
}
