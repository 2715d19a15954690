// techstore/src/store/memory.rs

//! In-process store. A transaction holds the state lock for its whole lifetime and
//! works on a private copy, which replaces the shared state on commit. Transactions
//! are therefore fully serialized, and an uncommitted one leaves no trace.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{
  OrderRepository, PageRequest, ProductRepository, ReviewRepository, StorageError, Store, StoreResult, StoreTx,
  UserRepository,
};
use crate::models::{
  NewOrder, NewOrderItem, NewProduct, NewReview, NewUser, Order, OrderItem, OrderStatus, PaymentStatus, Product,
  Review, ReviewWithAuthor, User,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
  // Vecs keep insertion order, which breaks ties between equal timestamps
  products: Vec<Product>,
  orders: Vec<Order>,
  order_items: Vec<OrderItem>,
  reviews: Vec<Review>,
  users: Vec<User>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
  state: Arc<Mutex<MemoryState>>,
  fail_on_commit: Arc<AtomicBool>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Makes every following commit fail, for exercising rollback paths.
  pub fn set_fail_on_commit(&self, fail: bool) {
    self.fail_on_commit.store(fail, Ordering::SeqCst);
  }
}

#[async_trait]
impl Store for MemoryStore {
  async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
    let guard = self.state.clone().lock_owned().await;
    let working = guard.clone();
    Ok(Box::new(MemoryTx {
      guard,
      working,
      fail_on_commit: self.fail_on_commit.clone(),
    }))
  }

  fn backend_name(&self) -> &'static str {
    "memory"
  }
}

pub struct MemoryTx {
  guard: OwnedMutexGuard<MemoryState>,
  working: MemoryState,
  fail_on_commit: Arc<AtomicBool>,
}

impl MemoryTx {
  fn product_mut(&mut self, id: Uuid) -> Option<&mut Product> {
    self.working.products.iter_mut().find(|p| p.id == id)
  }

  fn with_author(&self, review: &Review) -> ReviewWithAuthor {
    let user_name = self
      .working
      .users
      .iter()
      .find(|u| u.id == review.user_id)
      .map(|u| u.name.clone())
      .unwrap_or_default();
    ReviewWithAuthor {
      review: review.clone(),
      user_name,
    }
  }

  fn newest_first<T, F>(mut rows: Vec<T>, created_at: F) -> Vec<T>
  where
    F: Fn(&T) -> DateTime<Utc>,
  {
    // Reverse insertion order first so the stable sort keeps later inserts ahead on ties
    rows.reverse();
    rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
    rows
  }

  fn sorted_by_name(mut rows: Vec<Product>) -> Vec<Product> {
    rows.sort_by(|a, b| a.name.cmp(&b.name));
    rows
  }
}

#[async_trait]
impl ProductRepository for MemoryTx {
  async fn list_products(&mut self) -> StoreResult<Vec<Product>> {
    Ok(Self::sorted_by_name(self.working.products.clone()))
  }

  async fn find_product(&mut self, id: Uuid) -> StoreResult<Option<Product>> {
    Ok(self.working.products.iter().find(|p| p.id == id).cloned())
  }

  async fn search_products(&mut self, term: &str) -> StoreResult<Vec<Product>> {
    let hits = self
      .working
      .products
      .iter()
      .filter(|p| p.matches_term(term))
      .cloned()
      .collect();
    Ok(Self::sorted_by_name(hits))
  }

  async fn products_in_category(&mut self, category: &str) -> StoreResult<Vec<Product>> {
    let hits = self
      .working
      .products
      .iter()
      .filter(|p| p.in_category(category))
      .cloned()
      .collect();
    Ok(Self::sorted_by_name(hits))
  }

  async fn categories(&mut self) -> StoreResult<Vec<String>> {
    let mut categories: Vec<String> = self
      .working
      .products
      .iter()
      .filter_map(|p| p.category.clone())
      .collect();
    categories.sort();
    categories.dedup();
    Ok(categories)
  }

  async fn products_with_stock_below(&mut self, threshold: i32) -> StoreResult<Vec<Product>> {
    let hits = self
      .working
      .products
      .iter()
      .filter(|p| p.stock < threshold)
      .cloned()
      .collect();
    Ok(Self::sorted_by_name(hits))
  }

  async fn products_with_stock_equal(&mut self, stock: i32) -> StoreResult<Vec<Product>> {
    let hits = self
      .working
      .products
      .iter()
      .filter(|p| p.stock == stock)
      .cloned()
      .collect();
    Ok(Self::sorted_by_name(hits))
  }

  async fn insert_product(&mut self, product: &NewProduct) -> StoreResult<Product> {
    let now = Utc::now();
    let row = Product {
      id: Uuid::new_v4(),
      name: product.name.clone(),
      description: product.description.clone(),
      price: product.price,
      stock: product.stock,
      image_url: product.image_url.clone(),
      category: product.category.clone(),
      created_at: now,
      updated_at: now,
    };
    self.working.products.push(row.clone());
    Ok(row)
  }

  async fn count_products(&mut self) -> StoreResult<i64> {
    Ok(self.working.products.len() as i64)
  }

  async fn try_reduce_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool> {
    match self.product_mut(id) {
      Some(product) if product.stock >= quantity => {
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(true)
      }
      _ => Ok(false),
    }
  }

  async fn increase_stock(&mut self, id: Uuid, quantity: i32) -> StoreResult<bool> {
    match self.product_mut(id) {
      Some(product) => {
        product.stock += quantity;
        product.updated_at = Utc::now();
        Ok(true)
      }
      None => Ok(false),
    }
  }
}

#[async_trait]
impl OrderRepository for MemoryTx {
  async fn insert_order(&mut self, order: &NewOrder) -> StoreResult<Order> {
    if self.working.orders.iter().any(|o| o.order_number == order.order_number) {
      return Err(StorageError::UniqueViolation(format!(
        "order_number {}",
        order.order_number
      )));
    }
    let now = Utc::now();
    let row = Order {
      id: Uuid::new_v4(),
      user_id: order.user_id,
      order_number: order.order_number.clone(),
      status: order.status,
      subtotal: order.subtotal,
      shipping_cost: order.shipping_cost,
      tax_amount: order.tax_amount,
      total_amount: order.total_amount,
      shipping_name: order.shipping_name.clone(),
      shipping_email: order.shipping_email.clone(),
      shipping_phone: order.shipping_phone.clone(),
      shipping_address: order.shipping_address.clone(),
      shipping_city: order.shipping_city.clone(),
      shipping_state: order.shipping_state.clone(),
      shipping_postal_code: order.shipping_postal_code.clone(),
      shipping_country: order.shipping_country.clone(),
      payment_method: order.payment_method,
      payment_status: order.payment_status,
      payment_transaction_id: None,
      notes: order.notes.clone(),
      created_at: now,
      updated_at: now,
      estimated_delivery: Some(order.estimated_delivery),
    };
    self.working.orders.push(row.clone());
    Ok(row)
  }

  async fn insert_order_item(&mut self, item: &NewOrderItem) -> StoreResult<OrderItem> {
    if !self.working.orders.iter().any(|o| o.id == item.order_id) {
      return Err(StorageError::Missing(format!("order {}", item.order_id)));
    }
    let row = OrderItem {
      id: Uuid::new_v4(),
      order_id: item.order_id,
      line_no: item.line_no,
      product_id: item.product_id,
      product_name: item.product_name.clone(),
      product_image_url: item.product_image_url.clone(),
      quantity: item.quantity,
      unit_price: item.unit_price,
      total_price: item.total_price,
    };
    self.working.order_items.push(row.clone());
    Ok(row)
  }

  async fn update_order_payment(
    &mut self,
    order_id: Uuid,
    status: OrderStatus,
    payment_status: PaymentStatus,
    transaction_id: Option<&str>,
  ) -> StoreResult<Order> {
    let order = self
      .working
      .orders
      .iter_mut()
      .find(|o| o.id == order_id)
      .ok_or_else(|| StorageError::Missing(format!("order {}", order_id)))?;
    order.status = status;
    order.payment_status = payment_status;
    order.payment_transaction_id = transaction_id.map(str::to_string);
    order.updated_at = Utc::now();
    Ok(order.clone())
  }

  async fn orders_for_user(&mut self, user_id: Uuid) -> StoreResult<Vec<Order>> {
    let rows = self
      .working
      .orders
      .iter()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    Ok(Self::newest_first(rows, |o: &Order| o.created_at))
  }

  async fn find_order_for_user(&mut self, user_id: Uuid, order_id: Uuid) -> StoreResult<Option<Order>> {
    Ok(
      self
        .working
        .orders
        .iter()
        .find(|o| o.id == order_id && o.user_id == user_id)
        .cloned(),
    )
  }

  async fn items_for_order(&mut self, order_id: Uuid) -> StoreResult<Vec<OrderItem>> {
    let mut items: Vec<OrderItem> = self
      .working
      .order_items
      .iter()
      .filter(|i| i.order_id == order_id)
      .cloned()
      .collect();
    items.sort_by_key(|i| i.line_no);
    Ok(items)
  }
}

#[async_trait]
impl ReviewRepository for MemoryTx {
  async fn insert_review(&mut self, review: &NewReview) -> StoreResult<Review> {
    if self
      .working
      .reviews
      .iter()
      .any(|r| r.user_id == review.user_id && r.product_id == review.product_id)
    {
      return Err(StorageError::UniqueViolation("reviews (user_id, product_id)".to_string()));
    }
    let now = Utc::now();
    let row = Review {
      id: Uuid::new_v4(),
      user_id: review.user_id,
      product_id: review.product_id,
      rating: review.rating,
      comment: review.comment.clone(),
      is_verified_purchase: review.is_verified_purchase,
      created_at: now,
      updated_at: now,
    };
    self.working.reviews.push(row.clone());
    Ok(row)
  }

  async fn find_review(&mut self, id: Uuid) -> StoreResult<Option<ReviewWithAuthor>> {
    Ok(
      self
        .working
        .reviews
        .iter()
        .find(|r| r.id == id)
        .map(|r| self.with_author(r)),
    )
  }

  async fn find_review_by_author(&mut self, user_id: Uuid, product_id: Uuid) -> StoreResult<Option<Review>> {
    Ok(
      self
        .working
        .reviews
        .iter()
        .find(|r| r.user_id == user_id && r.product_id == product_id)
        .cloned(),
    )
  }

  async fn update_review(&mut self, id: Uuid, rating: i32, comment: Option<&str>) -> StoreResult<Review> {
    let review = self
      .working
      .reviews
      .iter_mut()
      .find(|r| r.id == id)
      .ok_or_else(|| StorageError::Missing(format!("review {}", id)))?;
    review.rating = rating;
    review.comment = comment.map(str::to_string);
    review.updated_at = Utc::now();
    Ok(review.clone())
  }

  async fn delete_review(&mut self, id: Uuid) -> StoreResult<()> {
    let before = self.working.reviews.len();
    self.working.reviews.retain(|r| r.id != id);
    if self.working.reviews.len() == before {
      return Err(StorageError::Missing(format!("review {}", id)));
    }
    Ok(())
  }

  async fn reviews_for_product(
    &mut self,
    product_id: Uuid,
    page: Option<PageRequest>,
  ) -> StoreResult<Vec<ReviewWithAuthor>> {
    let rows: Vec<ReviewWithAuthor> = self
      .working
      .reviews
      .iter()
      .filter(|r| r.product_id == product_id)
      .map(|r| self.with_author(r))
      .collect();
    let rows = Self::newest_first(rows, |r: &ReviewWithAuthor| r.review.created_at);
    Ok(match page {
      Some(p) => rows
        .into_iter()
        .skip(p.offset() as usize)
        .take(p.size as usize)
        .collect(),
      None => rows,
    })
  }

  async fn count_reviews_for_product(&mut self, product_id: Uuid) -> StoreResult<i64> {
    Ok(self.working.reviews.iter().filter(|r| r.product_id == product_id).count() as i64)
  }

  async fn average_rating_for_product(&mut self, product_id: Uuid) -> StoreResult<Option<f64>> {
    let ratings: Vec<i32> = self
      .working
      .reviews
      .iter()
      .filter(|r| r.product_id == product_id)
      .map(|r| r.rating)
      .collect();
    if ratings.is_empty() {
      return Ok(None);
    }
    let sum: i64 = ratings.iter().map(|r| i64::from(*r)).sum();
    Ok(Some(sum as f64 / ratings.len() as f64))
  }

  async fn rating_counts_for_product(&mut self, product_id: Uuid) -> StoreResult<Vec<(i32, i64)>> {
    let mut counts = std::collections::BTreeMap::<i32, i64>::new();
    for review in self.working.reviews.iter().filter(|r| r.product_id == product_id) {
      *counts.entry(review.rating).or_insert(0) += 1;
    }
    Ok(counts.into_iter().collect())
  }

  async fn reviews_by_user(&mut self, user_id: Uuid) -> StoreResult<Vec<ReviewWithAuthor>> {
    let rows: Vec<ReviewWithAuthor> = self
      .working
      .reviews
      .iter()
      .filter(|r| r.user_id == user_id)
      .map(|r| self.with_author(r))
      .collect();
    Ok(Self::newest_first(rows, |r: &ReviewWithAuthor| r.review.created_at))
  }
}

#[async_trait]
impl UserRepository for MemoryTx {
  async fn find_user(&mut self, id: Uuid) -> StoreResult<Option<User>> {
    Ok(self.working.users.iter().find(|u| u.id == id).cloned())
  }

  async fn find_user_by_email(&mut self, email: &str) -> StoreResult<Option<User>> {
    Ok(
      self
        .working
        .users
        .iter()
        .find(|u| u.email.eq_ignore_ascii_case(email))
        .cloned(),
    )
  }

  async fn insert_user(&mut self, user: &NewUser) -> StoreResult<User> {
    if self.working.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
      return Err(StorageError::UniqueViolation(format!("users.email {}", user.email)));
    }
    let row = User {
      id: Uuid::new_v4(),
      name: user.name.clone(),
      email: user.email.clone(),
      password_hash: user.password_hash.clone(),
      role: user.role,
      created_at: Utc::now(),
      last_login: None,
    };
    self.working.users.push(row.clone());
    Ok(row)
  }

  async fn record_login(&mut self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
    let user = self
      .working
      .users
      .iter_mut()
      .find(|u| u.id == id)
      .ok_or_else(|| StorageError::Missing(format!("user {}", id)))?;
    user.last_login = Some(at);
    Ok(())
  }

  async fn count_users(&mut self) -> StoreResult<i64> {
    Ok(self.working.users.len() as i64)
  }
}

#[async_trait]
impl StoreTx for MemoryTx {
  async fn commit(self: Box<Self>) -> StoreResult<()> {
    if self.fail_on_commit.load(Ordering::SeqCst) {
      return Err(StorageError::Unavailable("commit rejected by memory store".to_string()));
    }
    let MemoryTx { mut guard, working, .. } = *self;
    *guard = working;
    Ok(())
  }
}
