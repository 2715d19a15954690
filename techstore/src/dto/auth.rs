// techstore/src/dto/auth.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Role, User};

#[derive(Deserialize)]
pub struct RegisterRequest {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

// Passwords never reach the logs
impl fmt::Debug for RegisterRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RegisterRequest")
      .field("name", &self.name)
      .field("email", &self.email)
      .finish_non_exhaustive()
  }
}

#[derive(Deserialize)]
pub struct LoginRequest {
  #[serde(default)]
  pub email: String,
  #[serde(default)]
  pub password: String,
}

impl fmt::Debug for LoginRequest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("LoginRequest").field("email", &self.email).finish_non_exhaustive()
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserDto {
  fn from(user: &User) -> Self {
    Self {
      id: user.id,
      name: user.name.clone(),
      email: user.email.clone(),
      role: user.role,
      created_at: user.created_at,
      last_login: user.last_login,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
  pub token: String,
  #[serde(rename = "type")]
  pub token_type: &'static str,
  pub user: UserDto,
  pub message: String,
  pub success: bool,
}

impl AuthResponse {
  pub fn bearer(token: String, user: &User, message: impl Into<String>) -> Self {
    Self {
      token,
      token_type: "Bearer",
      user: UserDto::from(user),
      message: message.into(),
      success: true,
    }
  }
}
