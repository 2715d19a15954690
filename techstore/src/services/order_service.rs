// techstore/src/services/order_service.rs

use orka::{ContextData, Orka, PipelineResult};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::CheckoutSettings;
use crate::dto::order::{CheckoutCommand, OrderResponse};
use crate::errors::{AppError, Result as AppResult};
use crate::models::AuthenticatedUser;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::order_number::OrderNumberGenerator;
use crate::services::payment_gateway::PaymentGateway;
use crate::store::{OrderRepository, Store};

/// Business-rule failures reach the caller as-is; anything else becomes a generic
/// `OrderCreationFailed` after being logged.
fn classify_checkout_error(err: AppError) -> AppError {
  match err {
    AppError::ProductNotFound(_)
    | AppError::InsufficientStock { .. }
    | AppError::InvalidPaymentMethod(_)
    | AppError::Validation(_)
    | AppError::InvalidPayload(_) => err,
    other => {
      error!(error = %other, "Checkout failed unexpectedly, transaction rolled back");
      AppError::OrderCreationFailed(other.to_string())
    }
  }
}

#[derive(Clone)]
pub struct OrderService {
  store: Arc<dyn Store>,
  gateway: Arc<dyn PaymentGateway>,
  order_numbers: Arc<OrderNumberGenerator>,
  settings: CheckoutSettings,
  orka_instance: Arc<Orka<AppError>>,
}

impl OrderService {
  /// `orka_instance` must have the checkout pipeline registered.
  pub fn new(
    store: Arc<dyn Store>,
    gateway: Arc<dyn PaymentGateway>,
    settings: CheckoutSettings,
    orka_instance: Arc<Orka<AppError>>,
  ) -> Self {
    Self {
      store,
      gateway,
      order_numbers: Arc::new(OrderNumberGenerator::new()),
      settings,
      orka_instance,
    }
  }

  /// Runs the checkout workflow in one transaction.
  ///
  /// A declined payment is a successful call returning a CANCELLED order. Any error
  /// drops the transaction, so no order, line item or stock change survives it.
  #[instrument(
    name = "OrderService::create_order",
    skip(self, caller, command),
    fields(user_id = %caller.user_id, lines = command.lines.len()),
    err(Display)
  )]
  pub async fn create_order(&self, caller: &AuthenticatedUser, command: CheckoutCommand) -> AppResult<OrderResponse> {
    let tx = self.store.begin().await.map_err(|e| classify_checkout_error(e.into()))?;
    let ctx = ContextData::new(CheckoutCtxData::new(
      tx,
      caller.clone(),
      command,
      self.settings.clone(),
      self.gateway.clone(),
      self.order_numbers.clone(),
    ));

    match self.orka_instance.run(ctx.clone()).await {
      Ok(PipelineResult::Completed) => {}
      Ok(PipelineResult::Stopped) => {
        warn!("Checkout pipeline stopped before completion");
        return Err(AppError::OrderCreationFailed("checkout was halted".to_string()));
      }
      Err(e) => return Err(classify_checkout_error(e)),
    }

    let (tx, order, items) = {
      let mut guard = ctx.write();
      (guard.take_tx(), guard.order.take(), std::mem::take(&mut guard.items))
    };
    let tx = tx.ok_or_else(|| AppError::OrderCreationFailed("checkout lost its transaction".to_string()))?;
    let order = order.ok_or_else(|| AppError::OrderCreationFailed("no order was recorded".to_string()))?;
    tx.commit().await.map_err(|e| classify_checkout_error(e.into()))?;

    info!(order_id = %order.id, order_number = %order.order_number, status = %order.status, "Checkout finished");
    Ok(OrderResponse::from_parts(order, items))
  }

  /// The caller's orders, newest first.
  #[instrument(name = "OrderService::orders_for_user", skip(self, caller), fields(user_id = %caller.user_id), err(Display))]
  pub async fn orders_for_user(&self, caller: &AuthenticatedUser) -> AppResult<Vec<OrderResponse>> {
    let mut tx = self.store.begin().await?;
    let orders = tx.orders_for_user(caller.user_id).await?;
    let mut responses = Vec::with_capacity(orders.len());
    for order in orders {
      let items = tx.items_for_order(order.id).await?;
      responses.push(OrderResponse::from_parts(order, items));
    }
    Ok(responses)
  }

  /// Orders of other users are reported as not found.
  #[instrument(name = "OrderService::get_order", skip(self, caller), fields(user_id = %caller.user_id), err(Display))]
  pub async fn get_order(&self, caller: &AuthenticatedUser, order_id: Uuid) -> AppResult<OrderResponse> {
    let mut tx = self.store.begin().await?;
    let order = tx
      .find_order_for_user(caller.user_id, order_id)
      .await?
      .ok_or(AppError::OrderNotFound(order_id))?;
    let items = tx.items_for_order(order.id).await?;
    Ok(OrderResponse::from_parts(order, items))
  }

  pub async fn cancel_order(&self, caller: &AuthenticatedUser, order_id: Uuid) -> AppResult<OrderResponse> {
    // Ownership is still checked so the stub does not leak order existence
    self.get_order(caller, order_id).await?;
    Err(AppError::NotImplemented("Order cancellation is not available yet".to_string()))
  }
}
