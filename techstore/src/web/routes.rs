// techstore/src/web/routes.rs

use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::{web, HttpRequest};

use crate::errors::AppError;
use crate::web::handlers::{auth_handlers, order_handlers, product_handlers, review_handlers};

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}

// Malformed bodies and query strings answer with the same 400 envelope as validation errors.
fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Malformed JSON body: {}", err)).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
  AppError::Validation(format!("Invalid query string: {}", err)).into()
}

/// Called from `main.rs` and from the HTTP tests to mount the whole API.
/// Literal segments are registered before `{id}` captures so they are not shadowed.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(web::JsonConfig::default().error_handler(json_error_handler))
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .service(
      web::scope("/api")
        .route("/health", web::get().to(health_check_handler))
        .service(
          web::scope("/auth")
            .route("/register", web::post().to(auth_handlers::register_handler))
            .route("/login", web::post().to(auth_handlers::login_handler))
            .route("/refresh", web::post().to(auth_handlers::refresh_handler))
            .route("/validate", web::post().to(auth_handlers::validate_handler))
            .route("/profile", web::get().to(auth_handlers::profile_handler)),
        )
        .service(
          web::scope("/products")
            .route("", web::get().to(product_handlers::list_products_handler))
            .route("/search", web::get().to(product_handlers::search_products_handler))
            .route("/categories", web::get().to(product_handlers::categories_handler))
            .route(
              "/category/{category}",
              web::get().to(product_handlers::products_by_category_handler),
            )
            .route("/low-stock", web::get().to(product_handlers::low_stock_handler))
            .route("/out-of-stock", web::get().to(product_handlers::out_of_stock_handler))
            .route("/{product_id}", web::get().to(product_handlers::get_product_handler))
            .route(
              "/{product_id}/availability",
              web::get().to(product_handlers::availability_handler),
            )
            .route("/{product_id}/restock", web::post().to(product_handlers::restock_handler)),
        )
        .service(
          web::scope("/orders")
            .route("", web::get().to(order_handlers::list_orders_handler))
            .route("/checkout", web::post().to(order_handlers::checkout_handler))
            .route("/user", web::get().to(order_handlers::user_orders_handler))
            .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
            .route("/{order_id}/cancel", web::post().to(order_handlers::cancel_order_handler)),
        )
        .service(
          web::scope("/reviews")
            .route("", web::post().to(review_handlers::create_review_handler))
            .route("/user", web::get().to(review_handlers::my_reviews_handler))
            .route("/user/{user_id}", web::get().to(review_handlers::user_reviews_handler))
            .route(
              "/product/{product_id}",
              web::get().to(review_handlers::product_reviews_handler),
            )
            .route(
              "/product/{product_id}/paginated",
              web::get().to(review_handlers::product_reviews_page_handler),
            )
            .route(
              "/product/{product_id}/summary",
              web::get().to(review_handlers::review_summary_handler),
            )
            .route("/{review_id}", web::put().to(review_handlers::update_review_handler))
            .route("/{review_id}", web::delete().to(review_handlers::delete_review_handler)),
        ),
    );
}
