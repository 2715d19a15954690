// techstore/src/store/postgres.rs

//! PostgreSQL backend. One `sqlx::Transaction` per unit of work; stock is only ever
//! decremented through a conditional UPDATE, so concurrent checkouts cannot oversell.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
  OrderRepository, PageRequest, ProductRepository, ReviewRepository, StorageError, Store, StoreResult, StoreTx,
  UserRepository,
};
use crate::models::{
  NewOrder, NewOrderItem, NewProduct, NewReview, NewUser, Order, OrderItem, OrderStatus, PaymentStatus, Product,
  Review, ReviewWithAuthor, User,
};

const SCHEMA: &str = r#"
DO $$ BEGIN
  CREATE TYPE order_status_enum AS ENUM
    ('PENDING', 'CONFIRMED', 'PROCESSING', 'SHIPPED', 'DELIVERED', 'CANCELLED', 'REFUNDED');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
  CREATE TYPE payment_method_enum AS ENUM
    ('CREDIT_CARD', 'DEBIT_CARD', 'PAYPAL', 'BANK_TRANSFER', 'CASH_ON_DELIVERY');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
  CREATE TYPE payment_status_enum AS ENUM
    ('PENDING', 'PAID', 'FAILED', 'REFUNDED', 'PARTIALLY_REFUNDED');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

DO $$ BEGIN
  CREATE TYPE user_role_enum AS ENUM ('USER', 'ADMIN');
EXCEPTION WHEN duplicate_object THEN NULL; END $$;

CREATE TABLE IF NOT EXISTS users (
  id UUID PRIMARY KEY,
  name VARCHAR(100) NOT NULL,
  email VARCHAR(255) NOT NULL,
  password_hash TEXT NOT NULL,
  role user_role_enum NOT NULL DEFAULT 'USER',
  created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  last_login TIMESTAMPTZ
);
CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (LOWER(email));

CREATE TABLE IF NOT EXISTS products (
  id UUID PRIMARY KEY,
  name VARCHAR(255) NOT NULL,
  description TEXT,
  price NUMERIC(12, 2) NOT NULL CHECK (price >= 0),
  stock INTEGER NOT NULL CHECK (stock >= 0),
  image_url TEXT,
  category VARCHAR(100),
  created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS orders (
  id UUID PRIMARY KEY,
  user_id UUID NOT NULL REFERENCES users (id),
  order_number VARCHAR(64) NOT NULL UNIQUE,
  status order_status_enum NOT NULL,
  subtotal NUMERIC(12, 2) NOT NULL,
  shipping_cost NUMERIC(12, 2) NOT NULL,
  tax_amount NUMERIC(12, 2) NOT NULL,
  total_amount NUMERIC(12, 2) NOT NULL,
  shipping_name VARCHAR(100) NOT NULL,
  shipping_email VARCHAR(255) NOT NULL,
  shipping_phone VARCHAR(20),
  shipping_address VARCHAR(200) NOT NULL,
  shipping_city VARCHAR(50) NOT NULL,
  shipping_state VARCHAR(50) NOT NULL,
  shipping_postal_code VARCHAR(10) NOT NULL,
  shipping_country VARCHAR(50) NOT NULL,
  payment_method payment_method_enum NOT NULL,
  payment_status payment_status_enum NOT NULL,
  payment_transaction_id VARCHAR(100),
  notes TEXT,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  estimated_delivery TIMESTAMPTZ
);
CREATE INDEX IF NOT EXISTS orders_user_created_idx ON orders (user_id, created_at DESC);

CREATE TABLE IF NOT EXISTS order_items (
  id UUID PRIMARY KEY,
  order_id UUID NOT NULL REFERENCES orders (id) ON DELETE CASCADE,
  line_no INTEGER NOT NULL DEFAULT 0,
  product_id UUID NOT NULL REFERENCES products (id),
  product_name VARCHAR(255) NOT NULL,
  product_image_url TEXT,
  quantity INTEGER NOT NULL CHECK (quantity > 0),
  unit_price NUMERIC(12, 2) NOT NULL,
  total_price NUMERIC(12, 2) NOT NULL
);
ALTER TABLE order_items ADD COLUMN IF NOT EXISTS line_no INTEGER NOT NULL DEFAULT 0;
CREATE INDEX IF NOT EXISTS order_items_order_idx ON order_items (order_id, line_no);

CREATE TABLE IF NOT EXISTS reviews (
  id UUID PRIMARY KEY,
  user_id UUID NOT NULL REFERENCES users (id),
  product_id UUID NOT NULL REFERENCES products (id),
  rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
  comment VARCHAR(1000),
  is_verified_purchase BOOLEAN NOT NULL DEFAULT FALSE,
  created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
  UNIQUE (user_id, product_id)
);
CREATE INDEX IF NOT EXISTS reviews_product_created_idx ON reviews (product_id, created_at DESC);
"#;

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, image_url, category, created_at, updated_at";

const REVIEW_WITH_AUTHOR: &str = "SELECT r.id, r.user_id, r.product_id, r.rating, r.comment, r.is_verified_purchase, \
   r.created_at, r.updated_at, u.name AS user_name \
   FROM reviews r JOIN users u ON u.id = r.user_id";

/// Maps unique-constraint failures to their own variant so services can turn them into conflicts.
fn map_db_error(err: sqlx::Error) -> StorageError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return StorageError::UniqueViolation(db_err.constraint().unwrap_or("unique").to_string());
    }
  }
  StorageError::Database(err)
}

/// Escapes LIKE metacharacters and wraps the term for a substring match.
fn contains_pattern(term: &str) -> String {
  let escaped = term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
  format!("%{}%", escaped)
}

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  #[instrument(name = "PgStore::connect", skip(database_url), err(Display))]
  pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
    let pool = PgPoolOptions::new()
      .max_connections(max_connections)
      .connect(database_url)
      .await?;
    info!("Successfully connected to the database.");
    Ok(Self::new(pool))
  }

  /// Creates enum types, tables and indexes that do not exist yet.
  #[instrument(name = "PgStore::init", skip(self), err(Display))]
  pub async fn init(&self) -> StoreResult<()> {
    sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
    info!("Database schema is ready.");
    Ok(())
  }
}

#[async_trait]
impl Store for PgStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let tx = self.pool.begin().await?;
    Ok(Box::new(PgTx { tx }))
  }

  fn backend_name(&self) -> &'static str {
    "postgres"
  }
}

pub struct PgTx {
  tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl ProductRepository for PgTx {
  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products ORDER BY name ASC", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).fetch_all(&mut *self.tx).await?)
  }

  async fn find_product(&mut self, id: Uuid) -> StoreResult<Option<Product>> {
    let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&mut *self.tx).await?)
  }

  async fn search_products(&mut self, term: &str) -> StoreResult<Vec<Product>> {
    let sql = format!(
      "SELECT {} FROM products \
       WHERE name ILIKE $1 OR description ILIKE $1 OR category ILIKE $1 \
       ORDER BY name ASC",
      PRODUCT_COLUMNS
    );
    Ok(
      sqlx::query_as(&sql)
        .bind(contains_pattern(term))
        .fetch_all(&mut *self.tx)
        .await?,
    )
  }

  async fn products_in_category(&mut self, category: &str) -> StoreResult<Vec<Product>> {
    let sql = format!(
      "SELECT {} FROM products WHERE LOWER(category) = LOWER($1) ORDER BY name ASC",
      PRODUCT_COLUMNS
    );
    Ok(sqlx::query_as(&sql).bind(category).fetch_all(&mut *self.tx).await?)
  }

  async fn categories(&mut self) -> StoreResult<Vec<String>> {
    Ok(
      sqlx::query_scalar("SELECT DISTINCT category FROM products WHERE category IS NOT NULL ORDER BY category ASC")
        .fetch_all(&mut *self.tx)
        .await?,
    )
  }

  async fn products_with_stock_below(&mut self, threshold: i32) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products WHERE stock < $1 ORDER BY name ASC", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(threshold).fetch_all(&mut *self.tx).await?)
  }

  async fn products_with_stock_equal(&mut self, stock: i32) -> StoreResult<Vec<Product>> {
    let sql = format!("SELECT {} FROM products WHERE stock = $1 ORDER BY name ASC", PRODUCT_COLUMNS);
    Ok(sqlx::query_as(&sql).bind(stock).fetch_all(&mut *self.tx).await?)
  }

  async fn insert_product(&mut self, product: &NewProduct) -> StoreResult<Product> {
    let sql = format!(
      "INSERT INTO products (id, name, description, price, stock, image_url, category) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      PRODUCT_COLUMNS
    );
    sqlx::query_as(&sql)
      .bind(Uuid::new_v4())
      .bind(&product.name)
      .bind(&product.description)
      .bind(product.price)
      .bind(product.stock)
      .bind(&product.image_url)
      .bind(&product.category)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(map_db_error)
  }

  async fn count_products(&mut self) -> StoreResult<i64> {
    Ok(
      sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn try_reduce_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool> {
    // The row lock taken by UPDATE makes a concurrent decrement re-check the predicate
    let result = sqlx::query("UPDATE products SET stock = stock - $2, updated_at = now() WHERE id = $1 AND stock >= $2")
      .bind(id)
      .bind(quantity)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected() == 1)
  }

  async fn increase_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool> {
    let result = sqlx::query("UPDATE products SET stock = stock + $2, updated_at = now() WHERE id = $1")
      .bind(id)
      .bind(quantity)
      .execute(&mut *self.tx)
      .await?;
    Ok(result.rows_affected() == 1)
  }
}

#[async_trait]
impl OrderRepository for PgTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    sqlx::query_as(
      "INSERT INTO orders (id, user_id, order_number, status, subtotal, shipping_cost, tax_amount, total_amount, \
         shipping_name, shipping_email, shipping_phone, shipping_address, shipping_city, shipping_state, \
         shipping_postal_code, shipping_country, payment_method, payment_status, notes, estimated_delivery) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20) \
       RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(order.user_id)
    .bind(&order.order_number)
    .bind(order.status)
    .bind(order.subtotal)
    .bind(order.shipping_cost)
    .bind(order.tax_amount)
    .bind(order.total_amount)
    .bind(&order.shipping_name)
    .bind(&order.shipping_email)
    .bind(&order.shipping_phone)
    .bind(&order.shipping_address)
    .bind(&order.shipping_city)
    .bind(&order.shipping_state)
    .bind(&order.shipping_postal_code)
    .bind(&order.shipping_country)
    .bind(order.payment_method)
    .bind(order.payment_status)
    .bind(&order.notes)
    .bind(order.estimated_delivery)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(map_db_error)
  }

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem> {
    sqlx::query_as(
      "INSERT INTO order_items (id, order_id, line_no, product_id, product_name, product_image_url, quantity, unit_price, total_price) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(item.order_id)
    .bind(item.line_no)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(&item.product_image_url)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.total_price)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(map_db_error)
  }

  async fn update_order_payment(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    payment_status: PaymentStatus,
    transaction_id: Option<&str>,
  ) -> StoreResult<Order> {
    sqlx::query_as(
      "UPDATE orders SET status = $2, payment_status = $3, payment_transaction_id = $4, updated_at = now() \
       WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .bind(status)
    .bind(payment_status)
    .bind(transaction_id)
    .fetch_optional(&mut *self.tx)
    .await?
    .ok_or_else(|| StorageError::Missing(format!("order {}", order_id)))
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    Ok(
      sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC")
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?,
    )
  }

  async fn find_order_for_user(&mut self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(
      sqlx::query_as("SELECT * FROM orders WHERE id = $1 AND user_id = $2")
        .bind(order_id)
        .bind(user_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn items_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    Ok(
      sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY line_no ASC")
        .bind(order_id)
        .fetch_all(&mut *self.tx)
        .await?,
    )
  }
}

#[async_trait]
impl ReviewRepository for PgTx {
  async fn insert_review(&mut self, review: &NewReview) -> StoreResult<Review> {
    sqlx::query_as(
      "INSERT INTO reviews (id, user_id, product_id, rating, comment, is_verified_purchase) \
       VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(review.user_id)
    .bind(review.product_id)
    .bind(review.rating)
    .bind(&review.comment)
    .bind(review.is_verified_purchase)
    .fetch_one(&mut *self.tx)
    .await
    .map_err(map_db_error)
  }

  async fn find_review(&mut self, id: Uuid) -> StoreResult<Option<ReviewWithAuthor>> {
    let sql = format!("{} WHERE r.id = $1", REVIEW_WITH_AUTHOR);
    Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&mut *self.tx).await?)
  }

  async fn find_review_by_author(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Review>> {
    Ok(
      sqlx::query_as("SELECT * FROM reviews WHERE user_id = $1 AND product_id = $2")
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn update_review(&mut self, id: Uuid, rating: i32, comment: Option<&str>) -> StoreResult<Review> {
    sqlx::query_as("UPDATE reviews SET rating = $2, comment = $3, updated_at = now() WHERE id = $1 RETURNING *")
      .bind(id)
      .bind(rating)
      .bind(comment)
      .fetch_optional(&mut *self.tx)
      .await?
      .ok_or_else(|| StorageError::Missing(format!("review {}", id)))
  }

  async fn delete_review(&mut self, id: Uuid) -> StoreResult<()> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
      .bind(id)
      .execute(&mut *self.tx)
      .await?;
    if result.rows_affected() == 0 {
      return Err(StorageError::Missing(format!("review {}", id)));
    }
    Ok(())
  }

  async fn reviews_for_product(
    &mut self,
    product_id: Uuid,
    page: Option<PageRequest>,
  ) -> StoreResult<Vec<ReviewWithAuthor>> {
    match page {
      Some(p) => {
        let sql = format!(
          "{} WHERE r.product_id = $1 ORDER BY r.created_at DESC LIMIT $2 OFFSET $3",
          REVIEW_WITH_AUTHOR
        );
        Ok(
          sqlx::query_as(&sql)
            .bind(product_id)
            .bind(i64::from(p.size))
            .bind(p.offset() as i64)
            .fetch_all(&mut *self.tx)
            .await?,
        )
      }
      None => {
        let sql = format!("{} WHERE r.product_id = $1 ORDER BY r.created_at DESC", REVIEW_WITH_AUTHOR);
        Ok(sqlx::query_as(&sql).bind(product_id).fetch_all(&mut *self.tx).await?)
      }
    }
  }

  async fn count_reviews_for_product(&mut self, product_id: Uuid) -> StoreResult<i64> {
    Ok(
      sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn average_rating_for_product(&mut self, product_id: Uuid) -> StoreResult<Option<f64>> {
    Ok(
      sqlx::query_scalar("SELECT AVG(rating)::float8 FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&mut *self.tx)
        .await?,
    )
  }

  async fn rating_counts_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<(i32, i64)>> {
    Ok(
      sqlx::query_as("SELECT rating, COUNT(*) FROM reviews WHERE product_id = $1 GROUP BY rating ORDER BY rating")
        .bind(product_id)
        .fetch_all(&mut *self.tx)
        .await?,
    )
  }

  async fn reviews_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
    let sql = format!("{} WHERE r.user_id = $1 ORDER BY r.created_at DESC", REVIEW_WITH_AUTHOR);
    Ok(sqlx::query_as(&sql).bind(user_id).fetch_all(&mut *self.tx).await?)
  }
}

#[async_trait]
impl UserRepository for PgTx {
  async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
    Ok(
      sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    Ok(
      sqlx::query_as("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
        .bind(email)
        .fetch_optional(&mut *self.tx)
        .await?,
    )
  }

  async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User> {
    sqlx::query_as("INSERT INTO users (id, name, email, password_hash, role) VALUES ($1, $2, $3, $4, $5) RETURNING *")
      .bind(Uuid::new_v4())
      .bind(&user.name)
      .bind(&user.email)
      .bind(&user.password_hash)
      .bind(user.role)
      .fetch_one(&mut *self.tx)
      .await
      .map_err(map_db_error)
  }

  async fn record_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
    sqlx::query("UPDATE users SET last_login = $2 WHERE id = $1")
      .bind(id)
      .bind(at)
      .execute(&mut *self.tx)
      .await?;
    Ok(())
  }

  async fn count_users(&mut self) -> StoreResult<i64> {
    Ok(sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(&mut *self.tx).await?)
  }
}

#[async_trait]
impl StoreTx for PgTx {
  async fn commit(self: Box<Self>) -> StoreResult<()> {
    self.tx.commit().await.map_err(map_db_error)
  }
}
