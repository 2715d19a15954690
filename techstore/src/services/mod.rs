// techstore/src/services/mod.rs

pub mod auth_service;
pub mod catalog_service;
pub mod order_number;
pub mod order_service;
pub mod payment_gateway;
pub mod review_service;
pub mod token_service;

pub use auth_service::AuthService;
pub use catalog_service::CatalogService;
pub use order_service::OrderService;
pub use payment_gateway::{PaymentGateway, SimulatedGateway};
pub use review_service::ReviewService;
pub use token_service::TokenService;
