// techstore/src/services/catalog_service.rs

use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::errors::{AppError, Result as AppResult};
use crate::models::Product;
use crate::store::{ProductRepository, Store};

/// Products with fewer units than this are reported as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockCheck {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Clone)]
pub struct CatalogService {
  store: Arc<dyn Store>,
}

impl CatalogService {
  pub fn new(store: Arc<dyn Store>) -> Self {
    Self { store }
  }

  pub async fn list_products(&self) -> AppResult<Vec<Product>> {
    let mut tx = self.store.begin().await?;
    Ok(tx.list_products().await?)
  }

  #[instrument(name = "CatalogService::get_product", skip(self), err(Display))]
  pub async fn get_product(&self, product_id: Uuid) -> AppResult<Product> {
    let mut tx = self.store.begin().await?;
    tx.find_product(product_id)
      .await?
      .ok_or(AppError::ProductNotFound(product_id))
  }

  /// Blank terms match everything.
  pub async fn search(&self, term: &str) -> AppResult<Vec<Product>> {
    let term = term.trim();
    let mut tx = self.store.begin().await?;
    if term.is_empty() {
      return Ok(tx.list_products().await?);
    }
    Ok(tx.search_products(term).await?)
  }

  pub async fn products_in_category(&self, category: &str) -> AppResult<Vec<Product>> {
    let mut tx = self.store.begin().await?;
    Ok(tx.products_in_category(category.trim()).await?)
  }

  pub async fn categories(&self) -> AppResult<Vec<String>> {
    let mut tx = self.store.begin().await?;
    Ok(tx.categories().await?)
  }

  pub async fn low_stock(&self) -> AppResult<Vec<Product>> {
    let mut tx = self.store.begin().await?;
    Ok(tx.products_with_stock_below(LOW_STOCK_THRESHOLD).await?)
  }

  pub async fn out_of_stock(&self) -> AppResult<Vec<Product>> {
    let mut tx = self.store.begin().await?;
    Ok(tx.products_with_stock_equal(0).await?)
  }

  /// Unknown products never have enough stock.
  pub async fn has_enough_stock(&self, product_id: Uuid, quantity: i32) -> AppResult<bool> {
    let mut tx = self.store.begin().await?;
    Ok(
      tx.find_product(product_id)
        .await?
        .map_or(false, |p| p.stock >= quantity),
    )
  }

  /// Returns `false`, changing nothing, if the product is missing or short on stock.
  #[instrument(name = "CatalogService::reduce_stock", skip(self), err(Display))]
  pub async fn reduce_stock(&self, product_id: Uuid, quantity: i32) -> AppResult<bool> {
    ensure_positive(quantity)?;
    let mut tx = self.store.begin().await?;
    if !tx.try_reduce_stock(product_id, quantity).await? {
      warn!(%product_id, quantity, "Stock reduction refused");
      return Ok(false);
    }
    tx.commit().await?;
    info!(%product_id, quantity, "Stock reduced");
    Ok(true)
  }

  #[instrument(name = "CatalogService::increase_stock", skip(self), err(Display))]
  pub async fn increase_stock(&self, product_id: Uuid, quantity: i32) -> AppResult<Product> {
    ensure_positive(quantity)?;
    let mut tx = self.store.begin().await?;
    if !tx.increase_stock(product_id, quantity).await? {
      error!(%product_id, "Product not found while increasing stock");
      return Err(AppError::ProductNotFound(product_id));
    }
    let product = tx
      .find_product(product_id)
      .await?
      .ok_or(AppError::ProductNotFound(product_id))?;
    tx.commit().await?;
    info!(%product_id, new_stock = product.stock, "Stock increased");
    Ok(product)
  }

  pub async fn validate_stock_batch(&self, checks: &[StockCheck]) -> AppResult<bool> {
    let mut tx = self.store.begin().await?;
    for check in checks {
      let enough = tx
        .find_product(check.product_id)
        .await?
        .map_or(false, |p| p.stock >= check.quantity);
      if !enough {
        return Ok(false);
      }
    }
    Ok(true)
  }

  /// All-or-nothing: either every product loses its quantity or none does.
  #[instrument(name = "CatalogService::reduce_stock_batch", skip(self, checks), fields(lines = checks.len()), err(Display))]
  pub async fn reduce_stock_batch(&self, checks: &[StockCheck]) -> AppResult<()> {
    let mut tx = self.store.begin().await?;
    for check in checks {
      ensure_positive(check.quantity)?;
      reduce_or_explain(&mut *tx, check.product_id, check.quantity).await?;
    }
    tx.commit().await?;
    Ok(())
  }
}

fn ensure_positive(quantity: i32) -> AppResult<()> {
  if quantity < 1 {
    return Err(AppError::Validation("Quantity must be at least 1".to_string()));
  }
  Ok(())
}

/// Conditional decrement that turns a refusal into the matching business error.
pub(crate) async fn reduce_or_explain<R>(repo: &mut R, product_id: Uuid, quantity: i32) -> AppResult<()>
where
  R: ProductRepository + ?Sized,
{
  if repo.try_reduce_stock(product_id, quantity).await? {
    return Ok(());
  }
  match repo.find_product(product_id).await? {
    None => Err(AppError::ProductNotFound(product_id)),
    Some(product) => Err(AppError::InsufficientStock {
      product_id,
      product_name: product.name,
      available: product.stock,
      requested: quantity,
    }),
  }
}
