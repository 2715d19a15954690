// techstore/src/lib.rs

//! Storefront backend: accounts, product catalog, checkout and product reviews.
//!
//! The binary in `main.rs` only wires configuration, storage and the HTTP server;
//! everything it mounts lives here so integration tests can drive it directly.

pub mod config;
pub mod dto;
pub mod errors;
pub mod models;
pub mod money;
pub mod pipelines;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;
pub mod validation;
pub mod web;
