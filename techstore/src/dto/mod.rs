// techstore/src/dto/mod.rs

//! Wire shapes for the JSON API. Field names are camelCase on the wire.

pub mod auth;
pub mod order;
pub mod review;
