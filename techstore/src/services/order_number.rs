// techstore/src/services/order_number.rs

use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Hands out `ORD-<millis>` numbers that are strictly increasing within the process,
/// even when several orders are placed in the same millisecond.
#[derive(Debug, Default)]
pub struct OrderNumberGenerator {
  last: AtomicI64,
}

impl OrderNumberGenerator {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn next_number(&self) -> String {
    let now = Utc::now().timestamp_millis();
    let bump = |last: i64| Some(now.max(last + 1));
    let previous = match self.last.fetch_update(Ordering::SeqCst, Ordering::SeqCst, bump) {
      Ok(prev) | Err(prev) => prev,
    };
    format!("ORD-{}", now.max(previous + 1))
  }
}
