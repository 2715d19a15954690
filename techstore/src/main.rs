// techstore/src/main.rs

use std::sync::Arc;

use actix_web::middleware::DefaultHeaders;
use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use techstore::config::AppConfig;
use techstore::seed::seed_if_empty;
use techstore::services::{PaymentGateway, SimulatedGateway};
use techstore::state::AppState;
use techstore::store::init_store;
use techstore::web::configure_app_routes;

fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter) // RUST_LOG override
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration

  // LOG_FORMAT=json for log shippers, human-readable otherwise.
  if std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json")) {
    builder.json().init();
  } else {
    builder.init();
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  init_tracing();
  tracing::info!("Starting techstore server...");

  let app_config = Arc::new(AppConfig::from_env().context("loading configuration")?);
  tracing::info!(config = ?app_config, "Configuration loaded.");

  let store = init_store(&app_config).await.context("initialising storage")?;
  tracing::info!(backend = store.backend_name(), "Storage ready.");

  if app_config.seed_db {
    seed_if_empty(store.as_ref()).await.context("seeding sample data")?;
  }

  let gateway: Arc<dyn PaymentGateway> = Arc::new(SimulatedGateway::new(app_config.checkout.payment_success_rate));
  let app_state = AppState::new(app_config.clone(), store, gateway);

  let server_address = app_config.server_address();
  let allowed_origin = app_config.cors_allowed_origin.clone();
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(DefaultHeaders::new().add(("Access-Control-Allow-Origin", allowed_origin.clone())))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("binding {}", server_address))?
  .run()
  .await?;

  tracing::info!("Server stopped.");
  Ok(())
}
