// techstore/src/config.rs

use crate::errors::{AppError, Result}; // Use AppError specific Result
use dotenvy::dotenv;
use rust_decimal::Decimal;
use std::env;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
  Postgres,
  Memory,
}

impl FromStr for StorageBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
      "memory" | "mock" => Ok(StorageBackend::Memory),
      other => Err(AppError::Config(format!(
        "Unknown STORAGE_BACKEND '{}', expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

/// Knobs of the checkout workflow. Defaults match the storefront's published pricing.
#[derive(Debug, Clone)]
pub struct CheckoutSettings {
  pub shipping_flat_rate: Decimal,
  pub tax_rate: Decimal,
  /// Probability in [0, 1] that the simulated gateway approves a charge.
  pub payment_success_rate: f64,
  /// Put stock back when payment is declined.
  pub restock_on_payment_failure: bool,
  /// Price lines from the catalog instead of the client-sent price.
  pub enforce_catalog_prices: bool,
}

impl Default for CheckoutSettings {
  fn default() -> Self {
    Self {
      shipping_flat_rate: Decimal::new(9900, 2),
      tax_rate: Decimal::new(16, 2),
      payment_success_rate: 0.95,
      restock_on_payment_failure: false,
      enforce_catalog_prices: false,
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  pub storage_backend: StorageBackend,
  pub database_url: Option<String>,
  pub db_max_connections: u32,
  pub jwt_secret: String,
  pub jwt_ttl_hours: i64,
  pub cors_allowed_origin: String,
  pub checkout: CheckoutSettings,
  // Optional: for seeding the store on startup
  pub seed_db: bool,
}

// Secrets stay out of logs
impl fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("storage_backend", &self.storage_backend)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("db_max_connections", &self.db_max_connections)
      .field("jwt_secret", &"[REDACTED]")
      .field("jwt_ttl_hours", &self.jwt_ttl_hours)
      .field("cors_allowed_origin", &self.cors_allowed_origin)
      .field("checkout", &self.checkout)
      .field("seed_db", &self.seed_db)
      .finish()
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the configuration from any key lookup, so tests need not touch the process env.
  pub fn from_lookup<F>(lookup: F) -> Result<Self>
  where
    F: Fn(&str) -> Option<String>,
  {
    let get_env = |var_name: &str| {
      lookup(var_name)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Config(format!("Missing environment variable '{}'", var_name)))
    };
    fn parse<T: FromStr>(name: &str, raw: String) -> Result<T>
    where
      T::Err: fmt::Display,
    {
      raw
        .trim()
        .parse::<T>()
        .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, raw, e)))
    }

    let defaults = CheckoutSettings::default();

    let server_host = get_env("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let server_port = parse("SERVER_PORT", get_env("SERVER_PORT").unwrap_or_else(|_| "8080".to_string()))?;
    let storage_backend: StorageBackend = get_env("STORAGE_BACKEND")
      .unwrap_or_else(|_| "postgres".to_string())
      .parse()?;
    let database_url = get_env("DATABASE_URL").ok();
    if storage_backend == StorageBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "DATABASE_URL is required when STORAGE_BACKEND=postgres".to_string(),
      ));
    }
    let db_max_connections = match get_env("DB_MAX_CONNECTIONS") {
      Ok(raw) => parse("DB_MAX_CONNECTIONS", raw)?,
      Err(_) => 10,
    };

    let jwt_secret = get_env("JWT_SECRET")?;
    let jwt_ttl_hours: i64 = match get_env("JWT_TTL_HOURS") {
      Ok(raw) => parse("JWT_TTL_HOURS", raw)?,
      Err(_) => 24,
    };
    if jwt_ttl_hours <= 0 {
      return Err(AppError::Config("JWT_TTL_HOURS must be positive".to_string()));
    }

    let payment_success_rate: f64 = match get_env("PAYMENT_SUCCESS_RATE") {
      Ok(raw) => parse("PAYMENT_SUCCESS_RATE", raw)?,
      Err(_) => defaults.payment_success_rate,
    };
    if !(0.0..=1.0).contains(&payment_success_rate) {
      return Err(AppError::Config(
        "PAYMENT_SUCCESS_RATE must be between 0 and 1".to_string(),
      ));
    }
    let shipping_flat_rate: Decimal = match get_env("SHIPPING_FLAT_RATE") {
      Ok(raw) => parse("SHIPPING_FLAT_RATE", raw)?,
      Err(_) => defaults.shipping_flat_rate,
    };
    let tax_rate: Decimal = match get_env("TAX_RATE") {
      Ok(raw) => parse("TAX_RATE", raw)?,
      Err(_) => defaults.tax_rate,
    };
    if shipping_flat_rate.is_sign_negative() || tax_rate.is_sign_negative() {
      return Err(AppError::Config(
        "SHIPPING_FLAT_RATE and TAX_RATE must not be negative".to_string(),
      ));
    }
    let restock_on_payment_failure = match get_env("RESTOCK_ON_PAYMENT_FAILURE") {
      Ok(raw) => parse("RESTOCK_ON_PAYMENT_FAILURE", raw)?,
      Err(_) => defaults.restock_on_payment_failure,
    };
    let enforce_catalog_prices = match get_env("ENFORCE_CATALOG_PRICES") {
      Ok(raw) => parse("ENFORCE_CATALOG_PRICES", raw)?,
      Err(_) => defaults.enforce_catalog_prices,
    };

    let cors_allowed_origin = get_env("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "http://localhost:5173".to_string());
    let seed_db = match get_env("SEED_DB") {
      Ok(raw) => parse("SEED_DB", raw)?,
      Err(_) => false,
    };

    let config = Self {
      server_host,
      server_port,
      storage_backend,
      database_url,
      db_max_connections,
      jwt_secret,
      jwt_ttl_hours,
      cors_allowed_origin,
      checkout: CheckoutSettings {
        shipping_flat_rate,
        tax_rate,
        payment_success_rate,
        restock_on_payment_failure,
        enforce_catalog_prices,
      },
      seed_db,
    };
    tracing::info!("Application configuration loaded successfully.");
    tracing::debug!(config = ?config, "Loaded config details");
    Ok(config)
  }

  pub fn server_address(&self) -> String {
    format!("{}:{}", self.server_host, self.server_port)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn memory_backend_with_defaults() {
    let cfg = AppConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "memory"), ("JWT_SECRET", "s3cret")])).unwrap();
    assert_eq!(cfg.storage_backend, StorageBackend::Memory);
    assert_eq!(cfg.server_port, 8080);
    assert_eq!(cfg.jwt_ttl_hours, 24);
    assert_eq!(cfg.checkout.shipping_flat_rate, Decimal::new(9900, 2));
    assert_eq!(cfg.checkout.tax_rate, Decimal::new(16, 2));
    assert!(!cfg.checkout.restock_on_payment_failure);
    assert!(!cfg.seed_db);
  }

  #[test]
  fn jwt_secret_is_required() {
    let err = AppConfig::from_lookup(lookup(&[("STORAGE_BACKEND", "memory")])).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("JWT_SECRET")));
  }

  #[test]
  fn postgres_requires_database_url() {
    let err = AppConfig::from_lookup(lookup(&[("JWT_SECRET", "x")])).unwrap_err();
    assert!(matches!(err, AppError::Config(m) if m.contains("DATABASE_URL")));
  }

  #[test]
  fn rejects_out_of_range_success_rate() {
    let err = AppConfig::from_lookup(lookup(&[
      ("STORAGE_BACKEND", "memory"),
      ("JWT_SECRET", "x"),
      ("PAYMENT_SUCCESS_RATE", "1.5"),
    ]))
    .unwrap_err();
    assert!(matches!(err, AppError::Config(_)));
  }

  #[test]
  fn debug_output_redacts_secrets() {
    let cfg = AppConfig::from_lookup(lookup(&[
      ("DATABASE_URL", "postgres://user:pw@localhost/db"),
      ("JWT_SECRET", "topsecret"),
    ]))
    .unwrap();
    let rendered = format!("{:?}", cfg);
    assert!(!rendered.contains("topsecret"));
    assert!(!rendered.contains("pw@localhost"));
  }
}
