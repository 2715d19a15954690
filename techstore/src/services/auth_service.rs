// techstore/src/services/auth_service.rs

//! Account registration and sign-in. Passwords are hashed with Argon2; sessions are
//! stateless bearer tokens from [`TokenService`].

use argon2::{
  password_hash::{
    rand_core::OsRng, // For generating random salts
    PasswordHash,
    PasswordHasher,
    PasswordVerifier,
    SaltString,
  },
  Argon2,
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use crate::dto::auth::{AuthResponse, LoginRequest, RegisterRequest, UserDto};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{AuthenticatedUser, NewUser, Role, User};
use crate::services::token_service::TokenService;
use crate::store::{StorageError, Store, UserRepository};
use crate::validation;

/// Hashes a plain-text password using Argon2 with a fresh random salt.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> AppResult<String> {
  if password.is_empty() {
    return Err(AppError::Validation("Password cannot be empty for hashing.".to_string()));
  }

  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|hash| hash.to_string())
    .map_err(|argon_err| {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      AppError::Internal(format!("Password hashing process failed: {}", argon_err))
    })
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on mismatch. A hash that cannot be parsed is an internal error,
/// since it means the stored data is corrupt.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> AppResult<bool> {
  if provided_password.is_empty() {
    return Ok(false);
  }
  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other) => {
      error!(error = %other, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!("Password verification process failed: {}", other)))
    }
  }
}

#[derive(Clone)]
pub struct AuthService {
  store: Arc<dyn Store>,
  tokens: TokenService,
}

impl AuthService {
  pub fn new(store: Arc<dyn Store>, tokens: TokenService) -> Self {
    Self { store, tokens }
  }

  pub fn tokens(&self) -> &TokenService {
    &self.tokens
  }

  #[instrument(name = "AuthService::register", skip(self, request), fields(email = %request.email), err(Display))]
  pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
    validation::validate_registration(&request)?;
    let email = request.email.trim().to_lowercase();

    let mut tx = self.store.begin().await?;
    if tx.find_user_by_email(&email).await?.is_some() {
      warn!("Registration rejected: email already registered.");
      return Err(AppError::Conflict("Email is already registered".to_string()));
    }
    let password_hash = hash_password(&request.password)?;
    let mut user = tx
      .insert_user(&NewUser {
        name: request.name.trim().to_string(),
        email,
        password_hash,
        role: Role::User,
      })
      .await
      .map_err(|e| match e {
        StorageError::UniqueViolation(_) => AppError::Conflict("Email is already registered".to_string()),
        other => AppError::Storage(other),
      })?;
    let now = Utc::now();
    tx.record_login(user.id, now).await?;
    user.last_login = Some(now);
    tx.commit().await?;

    let token = self.tokens.issue(&user)?;
    info!(user_id = %user.id, "User registered.");
    Ok(AuthResponse::bearer(token, &user, "User registered successfully"))
  }

  #[instrument(name = "AuthService::login", skip(self, request), fields(email = %request.email), err(Display))]
  pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
    validation::validate_login(&request)?;
    let invalid = || AppError::Auth("Invalid credentials".to_string());

    let mut tx = self.store.begin().await?;
    let mut user = tx.find_user_by_email(request.email.trim()).await?.ok_or_else(invalid)?;
    if !verify_password(&user.password_hash, &request.password)? {
      warn!(user_id = %user.id, "Sign-in rejected: wrong password.");
      return Err(invalid());
    }
    let now = Utc::now();
    tx.record_login(user.id, now).await?;
    user.last_login = Some(now);
    tx.commit().await?;

    let token = self.tokens.issue(&user)?;
    info!(user_id = %user.id, "User signed in.");
    Ok(AuthResponse::bearer(token, &user, "Login successful"))
  }

  /// Loads the account behind a verified token; deleted accounts no longer authenticate.
  async fn current_user(&self, caller: &AuthenticatedUser) -> AppResult<User> {
    let mut tx = self.store.begin().await?;
    tx.find_user(caller.user_id)
      .await?
      .ok_or_else(|| AppError::Auth("Account no longer exists".to_string()))
  }

  #[instrument(name = "AuthService::refresh", skip(self, caller), fields(user_id = %caller.user_id), err(Display))]
  pub async fn refresh(&self, caller: &AuthenticatedUser) -> AppResult<AuthResponse> {
    let user = self.current_user(caller).await?;
    let token = self.tokens.issue(&user)?;
    Ok(AuthResponse::bearer(token, &user, "Token refreshed"))
  }

  #[instrument(name = "AuthService::validate", skip(self, caller, token), fields(user_id = %caller.user_id), err(Display))]
  pub async fn validate(&self, caller: &AuthenticatedUser, token: String) -> AppResult<AuthResponse> {
    let user = self.current_user(caller).await?;
    Ok(AuthResponse::bearer(token, &user, "Token is valid"))
  }

  pub async fn profile(&self, caller: &AuthenticatedUser) -> AppResult<UserDto> {
    let user = self.current_user(caller).await?;
    Ok(UserDto::from(&user))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  fn service() -> AuthService {
    AuthService::new(Arc::new(MemoryStore::new()), TokenService::new("test-secret", 1))
  }

  fn register_request(email: &str) -> RegisterRequest {
    RegisterRequest {
      name: "Juan".to_string(),
      email: email.to_string(),
      password: "user123".to_string(),
    }
  }

  #[test]
  fn hash_and_verify_round_trip() {
    let hash = hash_password("admin123").unwrap();
    assert!(verify_password(&hash, "admin123").unwrap());
    assert!(!verify_password(&hash, "admin124").unwrap());
    assert!(hash_password("").is_err());
  }

  #[tokio::test]
  async fn register_then_login() {
    let auth = service();
    let registered = auth.register(register_request("juan@email.com")).await.unwrap();
    assert_eq!(registered.token_type, "Bearer");
    assert_eq!(registered.user.role, Role::User);
    assert!(registered.user.last_login.is_some());

    let logged_in = auth
      .login(LoginRequest {
        email: "JUAN@email.com".to_string(),
        password: "user123".to_string(),
      })
      .await
      .unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);
    let caller = auth.tokens().verify(&logged_in.token).unwrap();
    assert_eq!(caller.user_id, registered.user.id);
  }

  #[tokio::test]
  async fn duplicate_registration_conflicts() {
    let auth = service();
    auth.register(register_request("maria@test.com")).await.unwrap();
    let err = auth.register(register_request("Maria@Test.com")).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
  }

  #[tokio::test]
  async fn wrong_password_is_unauthorized() {
    let auth = service();
    auth.register(register_request("ana@example.com")).await.unwrap();
    let err = auth
      .login(LoginRequest {
        email: "ana@example.com".to_string(),
        password: "nope-nope".to_string(),
      })
      .await
      .unwrap_err();
    assert!(matches!(err, AppError::Auth(_)));
  }
}
