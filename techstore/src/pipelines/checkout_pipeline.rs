// techstore/src/pipelines/checkout_pipeline.rs

//! The checkout workflow: cart in, persisted order out, all inside the transaction the
//! context carries.
//!
//! Steps, in order:
//! 1. `validate_stock`: every product exists and holds enough units, before any write.
//! 2. `price_cart`: subtotal, flat shipping, tax on the subtotal.
//! 3. `create_order_record`: PENDING order with a fresh order number.
//! 4. `materialize_line_items`: snapshot rows per cart line.
//! 5. `decrement_stock`: conditional decrement per line.
//! 6. `process_payment`: charge; CONFIRMED/PAID or CANCELLED/FAILED.
//! 7. `restock_after_failed_payment`: only when enabled and the charge was declined.

use chrono::{Duration, Utc};
use orka::core::step::SkipCondition;
use orka::{ContextData, Orka, Pipeline, PipelineControl};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dto::order::CheckoutLine;
use crate::errors::{AppError, Result as AppResult};
use crate::models::{NewOrder, NewOrderItem, OrderStatus, PaymentMethod, PaymentStatus};
use crate::money::{line_total, PriceBreakdown};
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::catalog_service::reduce_or_explain;
use crate::services::payment_gateway::{PaymentOutcome, PaymentRequest};
use crate::store::{OrderRepository, ProductRepository, StoreTx};

pub const ESTIMATED_DELIVERY_DAYS: i64 = 8;

fn restock_not_needed(ctx_data: ContextData<CheckoutCtxData>) -> bool {
  let guard = ctx_data.read();
  !(guard.settings.restock_on_payment_failure && guard.payment_declined())
}

pub fn checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let restock_skip: SkipCondition<CheckoutCtxData> = Arc::new(restock_not_needed);
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(&[
    ("validate_stock", false, None),
    ("price_cart", false, None),
    ("create_order_record", false, None),
    ("materialize_line_items", false, None),
    ("decrement_stock", false, None),
    ("process_payment", false, None),
    ("restock_after_failed_payment", true, Some(restock_skip)),
  ]);

  p.on_root("validate_stock", validate_stock);
  p.on_root("price_cart", price_cart);
  p.on_root("create_order_record", create_order_record);
  p.on_root("materialize_line_items", materialize_line_items);
  p.on_root("decrement_stock", decrement_stock);
  p.on_root("process_payment", process_payment);
  p.on_root("restock_after_failed_payment", restock_after_failed_payment);
  p
}

pub fn register_checkout_pipeline(orka_registry: &Orka<AppError>) {
  orka_registry.register_pipeline(checkout_pipeline());
}

fn missing(what: &str) -> AppError {
  AppError::Internal(format!("checkout context is missing {}", what))
}

fn checkout_tx(ctx_data: &ContextData<CheckoutCtxData>) -> AppResult<Box<dyn StoreTx>> {
  ctx_data.read().take_tx().ok_or_else(|| missing("transaction"))
}

/// Combined quantity per product, in first-seen order. A product may appear on several lines.
fn combined_quantities(lines: &[CheckoutLine]) -> AppResult<Vec<(Uuid, i32)>> {
  let mut requested: Vec<(Uuid, i32)> = Vec::new();
  for line in lines {
    match requested.iter_mut().find(|(id, _)| *id == line.product_id) {
      Some((product_id, qty)) => {
        *qty = qty.checked_add(line.quantity).ok_or_else(|| {
          AppError::Validation(format!("Requested quantity for product {} is too large", product_id))
        })?;
      }
      None => requested.push((line.product_id, line.quantity)),
    }
  }
  Ok(requested)
}

async fn validate_stock(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let requested = combined_quantities(&ctx_data.read().command.lines)?;
  let mut tx = checkout_tx(&ctx_data)?;

  let mut products = HashMap::with_capacity(requested.len());
  for (product_id, quantity) in requested {
    let product = tx
      .find_product(product_id)
      .await?
      .ok_or(AppError::ProductNotFound(product_id))?;
    if product.stock < quantity {
      warn!(%product_id, available = product.stock, requested = quantity, "Insufficient stock");
      return Err(AppError::InsufficientStock {
        product_id,
        product_name: product.name,
        available: product.stock,
        requested: quantity,
      });
    }
    products.insert(product_id, product);
  }

  let mut guard = ctx_data.write();
  guard.return_tx(tx);
  guard.products = products;
  Ok(PipelineControl::Continue)
}

async fn price_cart(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let mut guard = ctx_data.write();
  let mut unit_prices = Vec::with_capacity(guard.command.lines.len());
  for line in &guard.command.lines {
    let product = guard.products.get(&line.product_id).ok_or_else(|| missing("product snapshot"))?;
    if line.unit_price != product.price {
      warn!(
        product_id = %line.product_id,
        client_price = %line.unit_price,
        catalog_price = %product.price,
        "Client price differs from catalog price"
      );
    }
    unit_prices.push(if guard.settings.enforce_catalog_prices {
      product.price
    } else {
      line.unit_price
    });
  }

  let pricing = PriceBreakdown::compute(
    unit_prices
      .iter()
      .zip(&guard.command.lines)
      .map(|(price, line)| (*price, line.quantity)),
    guard.settings.shipping_flat_rate,
    guard.settings.tax_rate,
  )?;
  if pricing.total != guard.command.claimed_total {
    info!(computed = %pricing.total, claimed = %guard.command.claimed_total, "Claimed total differs from computed total");
  }
  guard.unit_prices = unit_prices;
  guard.pricing = Some(pricing);
  Ok(PipelineControl::Continue)
}

async fn create_order_record(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (new_order, payment_method) = {
    let guard = ctx_data.read();
    let payment_method: PaymentMethod = guard.command.payment_method.parse()?;
    let pricing = guard.pricing.ok_or_else(|| missing("pricing"))?;
    let shipping = &guard.command.shipping;
    let new_order = NewOrder {
      user_id: guard.caller.user_id,
      order_number: guard.order_numbers.next_number(),
      status: OrderStatus::Pending,
      subtotal: pricing.subtotal,
      shipping_cost: pricing.shipping_cost,
      tax_amount: pricing.tax_amount,
      total_amount: pricing.total,
      shipping_name: shipping.name.clone(),
      shipping_email: shipping.email.clone(),
      shipping_phone: shipping.phone.clone(),
      shipping_address: shipping.address.clone(),
      shipping_city: shipping.city.clone(),
      shipping_state: shipping.state.clone(),
      shipping_postal_code: shipping.postal_code.clone(),
      shipping_country: shipping.country.clone(),
      payment_method,
      payment_status: PaymentStatus::Pending,
      notes: guard.command.notes.clone(),
      estimated_delivery: Utc::now() + Duration::days(ESTIMATED_DELIVERY_DAYS),
    };
    (new_order, payment_method)
  };

  let mut tx = checkout_tx(&ctx_data)?;
  let order = tx.insert_order(&new_order).await?;
  info!(order_id = %order.id, order_number = %order.order_number, "Order record created");

  let mut guard = ctx_data.write();
  guard.return_tx(tx);
  guard.payment_method = Some(payment_method);
  guard.order = Some(order);
  Ok(PipelineControl::Continue)
}

async fn materialize_line_items(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let rows = {
    let guard = ctx_data.read();
    let order_id = guard.order.as_ref().map(|o| o.id).ok_or_else(|| missing("order"))?;
    let mut rows = Vec::with_capacity(guard.command.lines.len());
    for (line_no, (line, unit_price)) in guard.command.lines.iter().zip(&guard.unit_prices).enumerate() {
      let product = guard.products.get(&line.product_id).ok_or_else(|| missing("product snapshot"))?;
      rows.push(NewOrderItem {
        order_id,
        line_no: i32::try_from(line_no).map_err(|_| AppError::Validation("Too many cart lines".to_string()))?,
        product_id: line.product_id,
        product_name: product.name.clone(),
        product_image_url: product.image_url.clone(),
        quantity: line.quantity,
        unit_price: *unit_price,
        total_price: line_total(*unit_price, line.quantity)?,
      });
    }
    rows
  };

  let mut tx = checkout_tx(&ctx_data)?;
  let mut items = Vec::with_capacity(rows.len());
  for row in &rows {
    items.push(tx.insert_order_item(row).await?);
  }

  let mut guard = ctx_data.write();
  guard.return_tx(tx);
  guard.items = items;
  Ok(PipelineControl::Continue)
}

async fn decrement_stock(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let lines = ctx_data.read().command.lines.clone();
  let mut tx = checkout_tx(&ctx_data)?;
  for line in &lines {
    // Conditional update: a concurrent checkout that drained the stock since
    // validation makes this fail instead of going negative
    reduce_or_explain(&mut *tx, line.product_id, line.quantity).await?;
  }
  ctx_data.read().return_tx(tx);
  Ok(PipelineControl::Continue)
}

async fn process_payment(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let (request, gateway) = {
    let guard = ctx_data.read();
    let order = guard.order.as_ref().ok_or_else(|| missing("order"))?;
    let request = PaymentRequest {
      order_id: order.id,
      order_number: order.order_number.clone(),
      amount: order.total_amount,
      method: order.payment_method,
    };
    (request, guard.gateway.clone())
  };

  let outcome = gateway.charge(&request).await;
  let (status, payment_status) = match &outcome {
    PaymentOutcome::Approved { .. } => (OrderStatus::Confirmed, PaymentStatus::Paid),
    PaymentOutcome::Declined { reason } => {
      warn!(order_id = %request.order_id, %reason, "Payment declined, cancelling order");
      (OrderStatus::Cancelled, PaymentStatus::Failed)
    }
  };

  let mut tx = checkout_tx(&ctx_data)?;
  let updated = tx
    .update_order_payment(request.order_id, status, payment_status, outcome.transaction_id())
    .await?;
  info!(order_id = %updated.id, status = %updated.status, "Payment outcome recorded");

  let mut guard = ctx_data.write();
  guard.return_tx(tx);
  guard.order = Some(updated);
  guard.payment = Some(outcome);
  Ok(PipelineControl::Continue)
}

async fn restock_after_failed_payment(ctx_data: ContextData<CheckoutCtxData>) -> AppResult<PipelineControl> {
  let lines = ctx_data.read().command.lines.clone();
  let mut tx = checkout_tx(&ctx_data)?;
  for line in &lines {
    if !tx.increase_stock(line.product_id, line.quantity).await? {
      return Err(AppError::ProductNotFound(line.product_id));
    }
  }
  ctx_data.read().return_tx(tx);
  info!(lines = lines.len(), "Stock restored after declined payment");
  Ok(PipelineControl::Continue)
}
