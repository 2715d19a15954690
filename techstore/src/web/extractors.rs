// techstore/src/web/extractors.rs

use actix_web::dev::Payload;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use crate::errors::AppError;
use crate::models::AuthenticatedUser;
use crate::state::AppState;

/// Returns the token of an `Authorization: Bearer <token>` header, if present.
pub fn bearer_token(req: &HttpRequest) -> Option<&str> {
  req
    .headers()
    .get(AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|token| !token.is_empty())
}

/// Verifies the bearer token against the app's `TokenService`. Handlers that take an
/// `AuthenticatedUser` argument reject unauthenticated requests with 401 before running.
impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let Some(state) = req.app_data::<web::Data<AppState>>() else {
      return ready(Err(AppError::Internal("Application state is not configured".to_string())));
    };
    ready(match bearer_token(req) {
      Some(token) => state.auth.tokens().verify(token),
      None => Err(AppError::Auth("Missing bearer token".to_string())),
    })
  }
}
