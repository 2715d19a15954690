// techstore/src/models/order_item.rs

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Line item snapshot. Product name, image and unit price are copied at purchase
/// time so later catalog edits never change a past order.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct OrderItem {
  pub id: Uuid,
  pub order_id: Uuid,
  /// Zero-based position of the line in the cart it came from.
  pub line_no: i32,
  pub product_id: Uuid,
  pub product_name: String,
  pub product_image_url: Option<String>,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
  pub order_id: Uuid,
  pub line_no: i32,
  pub product_id: Uuid,
  pub product_name: String,
  pub product_image_url: Option<String>,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
}
