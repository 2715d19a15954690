// techstore/src/money.rs

//! Fixed-point money arithmetic for order pricing. All amounts carry exactly two
//! decimal places; halves round away from zero.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::errors::{AppError, Result as AppResult};

/// Rounds to cents, half away from zero, and pins the scale at 2.
pub fn round_money(amount: Decimal) -> Decimal {
  let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
  rounded.rescale(2);
  rounded
}

/// Largest amount a money column holds, NUMERIC(12, 2): 9999999999.99.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0xD4A5_0FFF, 0xE8, 0, false, 2);

fn too_large() -> AppError {
  AppError::Validation(format!("Order amount exceeds the maximum of {}", MAX_AMOUNT))
}

/// `unit_price * quantity`, rounded. Fails instead of overflowing.
pub fn line_total(unit_price: Decimal, quantity: i32) -> AppResult<Decimal> {
  unit_price
    .checked_mul(Decimal::from(quantity))
    .map(round_money)
    .filter(|total| *total <= MAX_AMOUNT)
    .ok_or_else(too_large)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceBreakdown {
  pub subtotal: Decimal,
  pub shipping_cost: Decimal,
  pub tax_amount: Decimal,
  pub total: Decimal,
}

impl PriceBreakdown {
  /// Prices a cart of `(unit_price, quantity)` lines.
  ///
  /// Tax applies to the subtotal only, never to shipping. The total is the sum of the
  /// three rounded components, so `total == subtotal + shipping_cost + tax_amount` holds exactly.
  /// Any amount beyond [`MAX_AMOUNT`] is rejected as a validation error.
  pub fn compute<I>(lines: I, shipping_flat_rate: Decimal, tax_rate: Decimal) -> AppResult<Self>
  where
    I: IntoIterator<Item = (Decimal, i32)>,
  {
    let mut subtotal = Decimal::ZERO;
    for (unit_price, quantity) in lines {
      subtotal = subtotal
        .checked_add(line_total(unit_price, quantity)?)
        .ok_or_else(too_large)?;
    }
    let subtotal = round_money(subtotal);
    let shipping_cost = round_money(shipping_flat_rate);
    let tax_amount = round_money(subtotal.checked_mul(tax_rate).ok_or_else(too_large)?);
    let total = subtotal
      .checked_add(shipping_cost)
      .and_then(|sum| sum.checked_add(tax_amount))
      .filter(|total| *total <= MAX_AMOUNT)
      .ok_or_else(too_large)?;
    Ok(Self {
      subtotal,
      shipping_cost,
      tax_amount,
      total,
    })
  }
}
