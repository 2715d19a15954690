// techstore/src/services/payment_gateway.rs

//! Payment authorization seam. The only shipped gateway is a simulation that approves
//! a configurable share of charges; tests plug in fixed rates.

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::models::PaymentMethod;

#[derive(Debug, Clone)]
pub struct PaymentRequest {
  pub order_id: Uuid,
  pub order_number: String,
  pub amount: Decimal,
  pub method: PaymentMethod,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentOutcome {
  Approved { transaction_id: String },
  Declined { reason: String },
}

impl PaymentOutcome {
  pub fn is_approved(&self) -> bool {
    matches!(self, PaymentOutcome::Approved { .. })
  }

  pub fn transaction_id(&self) -> Option<&str> {
    match self {
      PaymentOutcome::Approved { transaction_id } => Some(transaction_id),
      PaymentOutcome::Declined { .. } => None,
    }
  }
}

/// A decline is a normal outcome, not an error; gateways never fail the checkout.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome;
}

#[derive(Debug, Clone)]
pub struct SimulatedGateway {
  success_rate: f64,
}

impl SimulatedGateway {
  pub fn new(success_rate: f64) -> Self {
    Self {
      success_rate: success_rate.clamp(0.0, 1.0),
    }
  }

  pub fn always_approve() -> Self {
    Self::new(1.0)
  }

  pub fn always_decline() -> Self {
    Self::new(0.0)
  }
}

pub fn new_transaction_id() -> String {
  let suffix = Uuid::new_v4().simple().to_string();
  format!("TXN-{}-{}", Utc::now().timestamp_millis(), &suffix[..8])
}

#[async_trait]
impl PaymentGateway for SimulatedGateway {
  #[instrument(
    name = "SimulatedGateway::charge",
    skip(self, request),
    fields(order_number = %request.order_number, amount = %request.amount, method = %request.method)
  )]
  async fn charge(&self, request: &PaymentRequest) -> PaymentOutcome {
    let approved = rand::thread_rng().gen_bool(self.success_rate);
    if approved {
      let transaction_id = new_transaction_id();
      info!(%transaction_id, "Simulated payment approved");
      PaymentOutcome::Approved { transaction_id }
    } else {
      warn!("Simulated payment declined");
      PaymentOutcome::Declined {
        reason: "Payment was declined by the issuer".to_string(),
      }
    }
  }
}
