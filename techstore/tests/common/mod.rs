// techstore/tests/common/mod.rs

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use techstore::config::AppConfig;
use techstore::dto::auth::RegisterRequest;
use techstore::dto::order::{CheckoutCommand, CheckoutLine, ShippingAddress};
use techstore::models::{AuthenticatedUser, NewProduct, Product};
use techstore::services::{PaymentGateway, SimulatedGateway};
use techstore::state::AppState;
use techstore::store::{MemoryStore, ProductRepository, Store};

pub const TEST_PASSWORD: &str = "secret123";

pub struct TestApp {
  pub state: AppState,
  pub store: MemoryStore,
}

pub fn money(raw: &str) -> Decimal {
  raw.parse().expect("valid decimal literal")
}

/// Memory-backed config; `overrides` win over the defaults.
pub fn test_config(overrides: &[(&str, &str)]) -> AppConfig {
  AppConfig::from_lookup(|key| {
    if let Some((_, value)) = overrides.iter().find(|(k, _)| *k == key) {
      return Some(value.to_string());
    }
    match key {
      "STORAGE_BACKEND" => Some("memory".to_string()),
      "JWT_SECRET" => Some("integration-test-secret".to_string()),
      _ => None,
    }
  })
  .expect("test config is valid")
}

pub fn build_app_with(gateway: SimulatedGateway, overrides: &[(&str, &str)]) -> TestApp {
  let store = MemoryStore::new();
  let config = Arc::new(test_config(overrides));
  let gateway: Arc<dyn PaymentGateway> = Arc::new(gateway);
  let state = AppState::new(config, Arc::new(store.clone()), gateway);
  TestApp { state, store }
}

pub fn build_app() -> TestApp {
  build_app_with(SimulatedGateway::always_approve(), &[])
}

pub async fn add_product(store: &MemoryStore, name: &str, price: &str, stock: i32) -> Product {
  let mut tx = store.begin().await.unwrap();
  let product = tx
    .insert_product(&NewProduct {
      name: name.to_string(),
      description: Some(format!("{} for tests", name)),
      price: money(price),
      stock,
      image_url: None,
      category: Some("accesorios".to_string()),
    })
    .await
    .unwrap();
  tx.commit().await.unwrap();
  product
}

pub async fn stock_of(store: &MemoryStore, product_id: Uuid) -> i32 {
  let mut tx = store.begin().await.unwrap();
  tx.find_product(product_id).await.unwrap().unwrap().stock
}

/// Registers an account and returns the identity its token resolves to.
pub async fn register(state: &AppState, name: &str, email: &str) -> AuthenticatedUser {
  let response = state
    .auth
    .register(RegisterRequest {
      name: name.to_string(),
      email: email.to_string(),
      password: TEST_PASSWORD.to_string(),
    })
    .await
    .unwrap();
  state.auth.tokens().verify(&response.token).unwrap()
}

pub fn shipping() -> ShippingAddress {
  ShippingAddress {
    name: "Juan Pérez".to_string(),
    email: "juan@email.com".to_string(),
    phone: Some("5551234567".to_string()),
    address: "Av. Reforma 100".to_string(),
    city: "CDMX".to_string(),
    state: "CDMX".to_string(),
    postal_code: "06600".to_string(),
    country: "México".to_string(),
  }
}

pub fn command(lines: &[(Uuid, i32, &str)], payment_method: &str) -> CheckoutCommand {
  CheckoutCommand {
    lines: lines
      .iter()
      .map(|(product_id, quantity, price)| CheckoutLine {
        product_id: *product_id,
        quantity: *quantity,
        unit_price: money(price),
      })
      .collect(),
    shipping: shipping(),
    payment_method: payment_method.to_string(),
    claimed_total: Decimal::ZERO,
    notes: None,
  }
}
