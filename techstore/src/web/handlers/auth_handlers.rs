// techstore/src/web/handlers/auth_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::json;
use tracing::{info, instrument};

use crate::dto::auth::{LoginRequest, RegisterRequest};
use crate::errors::AppError;
use crate::models::AuthenticatedUser;
use crate::state::AppState;
use crate::web::extractors::bearer_token;

#[instrument(name = "handler::register", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
  let response = app_state.auth.register(req_payload.into_inner()).await?;
  info!(user_id = %response.user.id, "User registered");
  Ok(HttpResponse::Created().json(response))
}

#[instrument(name = "handler::login", skip(app_state, req_payload), fields(req_email = %req_payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  req_payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
  let response = app_state.auth.login(req_payload.into_inner()).await?;
  Ok(HttpResponse::Ok().json(response))
}

#[instrument(name = "handler::refresh", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn refresh_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let response = app_state.auth.refresh(&caller).await?;
  Ok(HttpResponse::Ok().json(response))
}

#[instrument(name = "handler::validate", skip_all, fields(user_id = %caller.user_id))]
pub async fn validate_handler(
  req: HttpRequest,
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  // The extractor already verified this header.
  let token = bearer_token(&req)
    .ok_or_else(|| AppError::Auth("Missing bearer token".to_string()))?
    .to_string();
  let response = app_state.auth.validate(&caller, token).await?;
  Ok(HttpResponse::Ok().json(response))
}

#[instrument(name = "handler::profile", skip(app_state, caller), fields(user_id = %caller.user_id))]
pub async fn profile_handler(
  app_state: web::Data<AppState>,
  caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let user = app_state.auth.profile(&caller).await?;
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "user": user
  })))
}
