// techstore/src/pipelines/contexts.rs

//! Context data the pipelines operate on. Handlers receive these wrapped in
//! `orka::ContextData`.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::CheckoutSettings;
use crate::dto::order::CheckoutCommand;
use crate::models::{AuthenticatedUser, Order, OrderItem, PaymentMethod, Product};
use crate::money::PriceBreakdown;
use crate::services::order_number::OrderNumberGenerator;
use crate::services::payment_gateway::{PaymentGateway, PaymentOutcome};
use crate::store::StoreTx;

/// State of one checkout. Owns the open transaction; dropping the context without
/// committing rolls every step back.
///
/// A step that talks to storage checks the transaction out with [`take_tx`](Self::take_tx),
/// awaits against it with no context lock held, and hands it back with
/// [`return_tx`](Self::return_tx). A step that fails drops it instead.
pub struct CheckoutCtxData {
  tx: Mutex<Option<Box<dyn StoreTx>>>,
  pub caller: AuthenticatedUser,
  pub command: CheckoutCommand,
  pub settings: CheckoutSettings,
  pub gateway: Arc<dyn PaymentGateway>,
  pub order_numbers: Arc<OrderNumberGenerator>,

  // --- filled in by the steps, in order ---
  /// Catalog rows as read by `validate_stock`.
  pub products: HashMap<Uuid, Product>,
  /// Unit price charged per cart line, index-aligned with `command.lines`.
  pub unit_prices: Vec<rust_decimal::Decimal>,
  pub pricing: Option<PriceBreakdown>,
  pub payment_method: Option<PaymentMethod>,
  pub order: Option<Order>,
  pub items: Vec<OrderItem>,
  pub payment: Option<PaymentOutcome>,
}

impl CheckoutCtxData {
  pub fn new(
    tx: Box<dyn StoreTx>,
    caller: AuthenticatedUser,
    command: CheckoutCommand,
    settings: CheckoutSettings,
    gateway: Arc<dyn PaymentGateway>,
    order_numbers: Arc<OrderNumberGenerator>,
  ) -> Self {
    Self {
      tx: Mutex::new(Some(tx)),
      caller,
      command,
      settings,
      gateway,
      order_numbers,
      products: HashMap::new(),
      unit_prices: Vec::new(),
      pricing: None,
      payment_method: None,
      order: None,
      items: Vec::new(),
      payment: None,
    }
  }

  pub fn take_tx(&self) -> Option<Box<dyn StoreTx>> {
    self.tx.lock().take()
  }

  pub fn return_tx(&self, tx: Box<dyn StoreTx>) {
    *self.tx.lock() = Some(tx);
  }

  pub fn payment_declined(&self) -> bool {
    matches!(self.payment, Some(ref outcome) if !outcome.is_approved())
  }
}
