// techstore/src/services/token_service.rs

//! Issues and verifies HS256 bearer tokens.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::models::{AuthenticatedUser, Role, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  pub sub: String, // Subject (user ID)
  pub email: String,
  pub role: Role,
  pub iat: i64,
  pub exp: i64, // Expiration time as UTC timestamp
}

#[derive(Clone)]
pub struct TokenService {
  encoding_key: Arc<EncodingKey>,
  decoding_key: Arc<DecodingKey>,
  ttl: Duration,
}

impl TokenService {
  pub fn new(secret: &str, ttl_hours: i64) -> Self {
    Self {
      encoding_key: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
      decoding_key: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
      ttl: Duration::hours(ttl_hours),
    }
  }

  #[instrument(name = "TokenService::issue", skip(self, user), fields(user_id = %user.id), err(Display))]
  pub fn issue(&self, user: &User) -> AppResult<String> {
    let now = Utc::now();
    let claims = Claims {
      sub: user.id.to_string(),
      email: user.email.clone(),
      role: user.role,
      iat: now.timestamp(),
      exp: (now + self.ttl).timestamp(),
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
      .map_err(|e| AppError::Internal(format!("Failed to encode token: {}", e)))
  }

  /// Checks signature and expiry and returns the caller identity the token carries.
  pub fn verify(&self, token: &str) -> AppResult<AuthenticatedUser> {
    let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256)).map_err(|e| {
      debug!(error = %e, "Rejected bearer token");
      AppError::Auth("Invalid or expired token".to_string())
    })?;
    let user_id = Uuid::parse_str(&data.claims.sub)
      .map_err(|_| AppError::Auth("Invalid or expired token".to_string()))?;
    Ok(AuthenticatedUser {
      user_id,
      email: data.claims.email,
      role: data.claims.role,
    })
  }
}
