// techstore/src/store/mod.rs

//! Persistence behind a unit-of-work seam.
//!
//! Every read and write goes through a [`StoreTx`] obtained from [`Store::begin`]. A
//! transaction is all-or-nothing: [`StoreTx::commit`] publishes every change made through
//! it, and dropping it without committing discards them. Backends:
//!
//! - `postgres`: sqlx transaction on a pooled connection.
//! - `memory`: process-local state, one writer at a time, used by tests and demos.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::config::{AppConfig, StorageBackend};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{
  NewOrder, NewOrderItem, NewProduct, NewReview, NewUser, Order, OrderItem, OrderStatus, PaymentStatus, Product,
  Review, ReviewWithAuthor, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StorageError {
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("unique constraint violated: {0}")]
  UniqueViolation(String),

  #[error("record not found: {0}")]
  Missing(String),

  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StorageError>;

/// Zero-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub size: u32,
}

impl PageRequest {
  pub fn offset(&self) -> u64 {
    u64::from(self.page) * u64::from(self.size)
  }
}

#[async_trait]
pub trait ProductRepository: Send {
  /// All products ordered by name.
  async fn list_products(&mut self) -> StoreResult<Vec<Product>>;
  async fn find_product(&mut self, id: Uuid) -> StoreResult<Option<Product>>;
  async fn search_products(&mut self, term: &str) -> StoreResult<Vec<Product>>;
  async fn products_in_category(&mut self, category: &str) -> StoreResult<Vec<Product>>;
  /// Distinct non-null categories, sorted ascending.
  async fn categories(&mut self) -> StoreResult<Vec<String>>;
  async fn products_with_stock_below(&mut self, threshold: i32) -> StoreResult<Vec<Product>>;
  async fn products_with_stock_equal(&mut self, stock: i32) -> StoreResult<Vec<Product>>;
  async fn insert_product(&mut self, product: &NewProduct) -> StoreResult<Product>;
  async fn count_products(&mut self) -> StoreResult<i64>;
  /// Conditional decrement. Returns `false`, changing nothing, when the product is
  /// missing or holds fewer than `quantity` units.
  async fn try_reduce_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool>;
  /// Returns `false` when the product does not exist.
  async fn increase_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool>;
}

#[async_trait]
pub trait OrderRepository: Send {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order>;
  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem>;
  async fn update_order_payment(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    payment_status: PaymentStatus,
    transaction_id: Option<&str>,
  ) -> StoreResult<Order>;
  /// Newest first.
  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>>;
  /// Only returns the order when it belongs to `user_id`.
  async fn find_order_for_user(&mut self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<Order>>;
  /// In cart order.
  async fn items_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>>;
}

#[async_trait]
pub trait ReviewRepository: Send {
  async fn insert_review(&mut self, review: &NewReview) -> StoreResult<Review>;
  async fn find_review(&mut self, id: Uuid) -> StoreResult<Option<ReviewWithAuthor>>;
  async fn find_review_by_author(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Review>>;
  async fn update_review(&mut self, id: Uuid, rating: i32, comment: Option<&str>) -> StoreResult<Review>;
  async fn delete_review(&mut self, id: Uuid) -> StoreResult<()>;
  /// Newest first; the whole list when `page` is `None`.
  async fn reviews_for_product(
    &mut self,
    product_id: Uuid,
    page: Option<PageRequest>,
  ) -> StoreResult<Vec<ReviewWithAuthor>>;
  async fn count_reviews_for_product(&mut self, product_id: Uuid) -> StoreResult<i64>;
  async fn average_rating_for_product(&mut self, product_id: Uuid) -> StoreResult<Option<f64>>;
  /// `(rating, count)` pairs for ratings that occur at least once.
  async fn rating_counts_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<(i32, i64)>>;
  /// Newest first.
  async fn reviews_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>>;
}

#[async_trait]
pub trait UserRepository: Send {
  async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<User>>;
  /// Case-insensitive on the email.
  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>>;
  async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User>;
  async fn record_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;
  async fn count_users(&mut self) -> StoreResult<i64>;
}

/// One unit of work over every repository.
#[async_trait]
pub trait StoreTx: ProductRepository + OrderRepository + ReviewRepository + UserRepository + Send {
  async fn commit(self: Box<Self>) -> StoreResult<()>;
}

#[async_trait]
pub trait Store: Send + Sync {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
  fn backend_name(&self) -> &'static str;
}

/// Builds the configured backend and makes sure its schema exists.
pub async fn init_store(config: &AppConfig) -> AppResult<Arc<dyn Store>> {
  info!(backend = ?config.storage_backend, "Initializing storage");
  match config.storage_backend {
    StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
    StorageBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set".to_string()))?;
      let store = PgStore::connect(url, config.db_max_connections).await?;
      store.init().await?;
      Ok(Arc::new(store))
    }
  }
}

