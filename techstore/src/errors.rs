// techstore/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use orka::OrkaError;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::store::StorageError;

/// One failed input constraint, reported back to the client by field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
  pub field: String,
  pub message: String,
}

impl FieldError {
  pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
    Self {
      field: field.into(),
      message: message.into(),
    }
  }
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  // Request payload failed one or more field constraints
  #[error("Invalid request payload ({} field error(s))", .0.len())]
  InvalidPayload(Vec<FieldError>),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Product not found: {0}")]
  ProductNotFound(Uuid),

  #[error("Insufficient stock for '{product_name}': available {available}, requested {requested}")]
  InsufficientStock {
    product_id: Uuid,
    product_name: String,
    available: i32,
    requested: i32,
  },

  #[error("Invalid payment method: {0}")]
  InvalidPaymentMethod(String),

  #[error("Order not found: {0}")]
  OrderNotFound(Uuid),

  #[error("Review not found: {0}")]
  ReviewNotFound(Uuid),

  #[error("You have already reviewed this product")]
  DuplicateReview,

  #[error("Conflict: {0}")]
  Conflict(String),

  #[error("Not implemented: {0}")]
  NotImplemented(String),

  // Checkout failed for a reason that is not the caller's fault
  #[error("Order creation failed: {0}")]
  OrderCreationFailed(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Storage Error: {0}")]
  Storage(#[from] StorageError),

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  /// Errors a caller can act on. Anything else is an unexpected failure.
  pub fn is_client_error(&self) -> bool {
    self.status_code().is_client_error()
  }
}

impl From<sqlx::Error> for AppError {
  fn from(err: sqlx::Error) -> Self {
    AppError::Storage(StorageError::from(err))
  }
}

// Framework-level failures (missing handler, unregistered pipeline) are never the caller's fault
impl From<OrkaError> for AppError {
  fn from(err: OrkaError) -> Self {
    AppError::Internal(format!("Orka pipeline error: {}", err))
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InvalidPayload(_) | AppError::InvalidPaymentMethod(_) => {
        StatusCode::BAD_REQUEST
      }
      // Stock shortfalls are reported as a bad request, the cart cannot be fulfilled as sent
      AppError::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) | AppError::ProductNotFound(_) | AppError::OrderNotFound(_) | AppError::ReviewNotFound(_) => {
        StatusCode::NOT_FOUND
      }
      AppError::DuplicateReview | AppError::Conflict(_) => StatusCode::CONFLICT,
      AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
      AppError::OrderCreationFailed(_) | AppError::Config(_) | AppError::Storage(_) | AppError::Internal(_) => {
        StatusCode::INTERNAL_SERVER_ERROR
      }
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      // Full detail goes to the log only
      tracing::error!(application_error = %self, "Responding with server error");
    } else {
      tracing::warn!(application_error = %self, status = status.as_u16(), "Responding with client error");
    }

    let body = match self {
      AppError::InvalidPayload(fields) => json!({
        "success": false,
        "error": "Validation failed",
        "fields": fields,
      }),
      AppError::InsufficientStock {
        product_id,
        available,
        requested,
        ..
      } => json!({
        "success": false,
        "error": self.to_string(),
        "productId": product_id,
        "available": available,
        "requested": requested,
      }),
      AppError::OrderCreationFailed(_) => json!({
        "success": false,
        "error": "Order could not be created. Please try again later.",
      }),
      AppError::Storage(_) | AppError::Internal(_) | AppError::Config(_) => json!({
        "success": false,
        "error": "An internal error occurred",
      }),
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Forbidden(m)
      | AppError::NotFound(m)
      | AppError::Conflict(m)
      | AppError::NotImplemented(m) => json!({"success": false, "error": m}),
      other => json!({"success": false, "error": other.to_string()}),
    };

    HttpResponse::build(status).json(body)
  }
}

// Define a Result type alias for the application
pub type Result<T, E = AppError> = std::result::Result<T, E>;
