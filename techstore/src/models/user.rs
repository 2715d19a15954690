// techstore/src/models/user.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "user_role_enum", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
  User,
  Admin,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub name: String,
  pub email: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: Role,
  pub created_at: DateTime<Utc>,
  pub last_login: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub name: String,
  pub email: String,
  pub password_hash: String,
  pub role: Role,
}

/// Verified caller identity, decoded from a bearer token. No credential material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub user_id: Uuid,
  pub email: String,
  pub role: Role,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == Role::Admin
  }
}
