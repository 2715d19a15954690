// techstore/src/models/mod.rs

//! Plain data records as they are persisted, plus the `New*` inputs used to create them.

pub mod order;
pub mod order_item;
pub mod product;
pub mod review;
pub mod user;

pub use order::{NewOrder, Order, OrderStatus, PaymentMethod, PaymentStatus};
pub use order_item::{NewOrderItem, OrderItem};
pub use product::{NewProduct, Product};
pub use review::{NewReview, Review, ReviewWithAuthor};
pub use user::{AuthenticatedUser, NewUser, Role, User};
