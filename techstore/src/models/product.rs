// techstore/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub stock: i32, // never negative at rest, enforced by the conditional decrement
  pub image_url: Option<String>,
  pub category: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Product {
  /// Case-insensitive substring match over name, description and category.
  pub fn matches_term(&self, term: &str) -> bool {
    let needle = term.to_lowercase();
    let hit = |field: Option<&str>| field.map_or(false, |v| v.to_lowercase().contains(&needle));
    hit(Some(&self.name)) || hit(self.description.as_deref()) || hit(self.category.as_deref())
  }

  pub fn in_category(&self, category: &str) -> bool {
    self
      .category
      .as_deref()
      .map_or(false, |c| c.to_lowercase() == category.to_lowercase())
  }
}

#[derive(Debug, Clone)]
pub struct NewProduct {
  pub name: String,
  pub description: Option<String>,
  pub price: Decimal,
  pub stock: i32,
  pub image_url: Option<String>,
  pub category: Option<String>,
}
