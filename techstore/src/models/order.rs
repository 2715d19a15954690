// techstore/src/models/order.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type as SqlxType};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::AppError;

// The checkout only ever moves an order from PENDING to CONFIRMED or CANCELLED.
// The remaining states belong to fulfilment flows outside this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "order_status_enum", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
}

impl OrderStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      OrderStatus::Pending => "PENDING",
      OrderStatus::Confirmed => "CONFIRMED",
      OrderStatus::Processing => "PROCESSING",
      OrderStatus::Shipped => "SHIPPED",
      OrderStatus::Delivered => "DELIVERED",
      OrderStatus::Cancelled => "CANCELLED",
      OrderStatus::Refunded => "REFUNDED",
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_method_enum", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
  CreditCard,
  DebitCard,
  Paypal,
  BankTransfer,
  CashOnDelivery,
}

impl PaymentMethod {
  pub const ALL: [PaymentMethod; 5] = [
    PaymentMethod::CreditCard,
    PaymentMethod::DebitCard,
    PaymentMethod::Paypal,
    PaymentMethod::BankTransfer,
    PaymentMethod::CashOnDelivery,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentMethod::CreditCard => "CREDIT_CARD",
      PaymentMethod::DebitCard => "DEBIT_CARD",
      PaymentMethod::Paypal => "PAYPAL",
      PaymentMethod::BankTransfer => "BANK_TRANSFER",
      PaymentMethod::CashOnDelivery => "CASH_ON_DELIVERY",
    }
  }
}

impl fmt::Display for PaymentMethod {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for PaymentMethod {
  type Err = AppError;

  /// Exact, case-sensitive match on the wire names (`CREDIT_CARD`, `PAYPAL`, ...).
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    PaymentMethod::ALL
      .into_iter()
      .find(|m| m.as_str() == s)
      .ok_or_else(|| AppError::InvalidPaymentMethod(s.to_string()))
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, SqlxType)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "payment_status_enum", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
  PartiallyRefunded,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "PENDING",
      PaymentStatus::Paid => "PAID",
      PaymentStatus::Failed => "FAILED",
      PaymentStatus::Refunded => "REFUNDED",
      PaymentStatus::PartiallyRefunded => "PARTIALLY_REFUNDED",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Order {
  pub id: Uuid,
  pub user_id: Uuid,
  pub order_number: String,
  pub status: OrderStatus,
  pub subtotal: Decimal,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub total_amount: Decimal,
  pub shipping_name: String,
  pub shipping_email: String,
  pub shipping_phone: Option<String>,
  pub shipping_address: String,
  pub shipping_city: String,
  pub shipping_state: String,
  pub shipping_postal_code: String,
  pub shipping_country: String,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub payment_transaction_id: Option<String>,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Everything needed to insert an order row; status and timestamps are set by the caller.
#[derive(Debug, Clone)]
pub struct NewOrder {
  pub user_id: Uuid,
  pub order_number: String,
  pub status: OrderStatus,
  pub subtotal: Decimal,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub total_amount: Decimal,
  pub shipping_name: String,
  pub shipping_email: String,
  pub shipping_phone: Option<String>,
  pub shipping_address: String,
  pub shipping_city: String,
  pub shipping_state: String,
  pub shipping_postal_code: String,
  pub shipping_country: String,
  pub payment_method: PaymentMethod,
  pub payment_status: PaymentStatus,
  pub notes: Option<String>,
  pub estimated_delivery: DateTime<Utc>,
}
