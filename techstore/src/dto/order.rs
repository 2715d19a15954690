// techstore/src/dto/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::models::{Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};

// Request side. Every field is optional or defaulted so that a missing value
// surfaces as a field error rather than a JSON parse failure.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  #[serde(default)]
  pub cart_items: Vec<CartItemPayload>,
  pub shipping_info: Option<ShippingInfoPayload>,
  pub payment_info: Option<PaymentInfoPayload>,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPayload {
  pub product_id: Option<Uuid>,
  pub quantity: Option<i32>,
  pub price: Option<Decimal>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfoPayload {
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub email: String,
  pub phone: Option<String>,
  #[serde(default)]
  pub address: String,
  #[serde(default)]
  pub city: String,
  #[serde(default)]
  pub state: String,
  #[serde(default)]
  pub postal_code: String,
  #[serde(default)]
  pub country: String,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfoPayload {
  #[serde(default)]
  pub payment_method: String,
  pub card_number: Option<String>,
  pub card_holder_name: Option<String>,
  pub expiry_month: Option<String>,
  pub expiry_year: Option<String>,
  pub cvv: Option<String>,
  pub paypal_email: Option<String>,
  pub bank_account: Option<String>,
  pub total_amount: Option<Decimal>,
}

// Card data is accepted but never stored or logged
impl fmt::Debug for PaymentInfoPayload {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PaymentInfoPayload")
      .field("payment_method", &self.payment_method)
      .field("total_amount", &self.total_amount)
      .finish_non_exhaustive()
  }
}

/// A checkout that passed input validation. Built by `validation::validate_checkout`.
#[derive(Debug, Clone)]
pub struct CheckoutCommand {
  pub lines: Vec<CheckoutLine>,
  pub shipping: ShippingAddress,
  /// Raw wire name; mapped to a [`PaymentMethod`] inside the workflow.
  pub payment_method: String,
  /// Client-computed total. Informational only, never trusted for pricing.
  pub claimed_total: Decimal,
  pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutLine {
  pub product_id: Uuid,
  pub quantity: i32,
  pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub name: String,
  pub email: String,
  pub phone: Option<String>,
  pub address: String,
  pub city: String,
  pub state: String,
  pub postal_code: String,
  pub country: String,
}

// Response side

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
  pub product_id: Uuid,
  pub product_name: String,
  pub product_image_url: Option<String>,
  pub quantity: i32,
  pub unit_price: Decimal,
  pub total_price: Decimal,
}

impl From<OrderItem> for OrderItemResponse {
  fn from(item: OrderItem) -> Self {
    Self {
      product_id: item.product_id,
      product_name: item.product_name,
      product_image_url: item.product_image_url,
      quantity: item.quantity,
      unit_price: item.unit_price,
      total_price: item.total_price,
    }
  }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
  pub id: Uuid,
  pub order_number: String,
  pub status: OrderStatus,
  pub total_amount: Decimal,
  pub subtotal: Decimal,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub created_at: DateTime<Utc>,
  pub estimated_delivery: Option<DateTime<Utc>>,
  pub shipping_info: ShippingAddress,
  pub payment_info: PaymentSummary,
  pub items: Vec<OrderItemResponse>,
  pub notes: Option<String>,
}

impl OrderResponse {
  pub fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
    Self {
      id: order.id,
      order_number: order.order_number,
      status: order.status,
      total_amount: order.total_amount,
      subtotal: order.subtotal,
      shipping_cost: order.shipping_cost,
      tax_amount: order.tax_amount,
      created_at: order.created_at,
      estimated_delivery: order.estimated_delivery,
      shipping_info: ShippingAddress {
        name: order.shipping_name,
        email: order.shipping_email,
        phone: order.shipping_phone,
        address: order.shipping_address,
        city: order.shipping_city,
        state: order.shipping_state,
        postal_code: order.shipping_postal_code,
        country: order.shipping_country,
      },
      payment_info: PaymentSummary {
        payment_method: order.payment_method,
        payment_status: order.payment_status,
        transaction_id: order.payment_transaction_id,
      },
      items: items.into_iter().map(OrderItemResponse::from).collect(),
      notes: order.notes,
    }
  }
}

