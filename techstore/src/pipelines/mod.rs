// techstore/src/pipelines/mod.rs

//! Defines and registers the Orka pipelines behind the multi-step workflows.

use orka::Orka;

use crate::errors::AppError;

pub mod checkout_pipeline;
pub mod contexts;

/// Registers every pipeline with the given registry. Called once while building
/// the application state.
pub fn register_all_pipelines(orka_instance: &Orka<AppError>) {
  tracing::info!("Registering Orka pipelines...");
  checkout_pipeline::register_checkout_pipeline(orka_instance);
  tracing::info!("All application pipelines registered with Orka.");
}
