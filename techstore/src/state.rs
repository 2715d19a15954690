// techstore/src/state.rs

use orka::Orka;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::pipelines;
use crate::services::{AuthService, CatalogService, OrderService, PaymentGateway, ReviewService, TokenService};
use crate::store::Store;

/// Shared with every handler through `web::Data`. Cloning is cheap, everything is behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>, // Share loaded config
  pub store: Arc<dyn Store>,
  pub orka_instance: Arc<Orka<AppError>>, // Pipelines are registered once, at construction
  pub auth: AuthService,
  pub catalog: CatalogService,
  pub orders: OrderService,
  pub reviews: ReviewService,
}

impl AppState {
  pub fn new(config: Arc<AppConfig>, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
    // Orka<AppError> so that Orka::run returns our AppError
    let orka_instance = Arc::new(Orka::<AppError>::new());
    pipelines::register_all_pipelines(&orka_instance);

    let tokens = TokenService::new(&config.jwt_secret, config.jwt_ttl_hours);
    Self {
      auth: AuthService::new(store.clone(), tokens),
      catalog: CatalogService::new(store.clone()),
      orders: OrderService::new(store.clone(), gateway, config.checkout.clone(), orka_instance.clone()),
      reviews: ReviewService::new(store.clone()),
      orka_instance,
      store,
      config,
    }
  }
}
