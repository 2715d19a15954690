// techstore/tests/http_api.rs

mod common;

use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use serde_json::{json, Value};

use common::*;
use techstore::web::configure_app_routes;

macro_rules! init_app {
  ($state:expr) => {
    test::init_service(
      App::new()
        .app_data(web::Data::new($state.clone()))
        .configure(configure_app_routes),
    )
    .await
  };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
  (header::AUTHORIZATION, format!("Bearer {}", token))
}

fn checkout_body(product_id: uuid::Uuid, quantity: i32, price: &str) -> Value {
  json!({
    "cartItems": [{ "productId": product_id, "quantity": quantity, "price": price }],
    "shippingInfo": {
      "name": "Juan Pérez",
      "email": "juan@email.com",
      "phone": "5551234567",
      "address": "Av. Reforma 100",
      "city": "CDMX",
      "state": "CDMX",
      "postalCode": "06600",
      "country": "México"
    },
    "paymentInfo": { "paymentMethod": "CREDIT_CARD", "totalAmount": "133.80" }
  })
}

#[actix_rt::test]
async fn health_check_answers_ok() {
  let app = build_app();
  let service = init_app!(app.state);
  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/health").to_request()).await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body, json!({ "status": "ok" }));
}

#[actix_rt::test]
async fn register_login_and_profile() {
  let app = build_app();
  let service = init_app!(app.state);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/register")
      .set_json(json!({ "name": "Juan Pérez", "email": "juan@email.com", "password": "user123" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["type"], "Bearer");
  assert_eq!(body["success"], true);
  assert_eq!(body["user"]["role"], "USER");
  assert!(body["user"].get("passwordHash").is_none());

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/register")
      .set_json(json!({ "name": "Otro", "email": "JUAN@email.com", "password": "user123" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": "juan@email.com", "password": "user123" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  let token = body["token"].as_str().unwrap().to_string();

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri("/api/auth/profile")
      .insert_header(bearer(&token))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["user"]["email"], "juan@email.com");
}

#[actix_rt::test]
async fn wrong_password_is_unauthorized() {
  let app = build_app();
  register(&app.state, "Juan Pérez", "juan@email.com").await;
  let service = init_app!(app.state);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/auth/login")
      .set_json(json!({ "email": "juan@email.com", "password": "wrong-password" }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], false);
}

#[actix_rt::test]
async fn order_routes_require_a_token() {
  let app = build_app();
  let service = init_app!(app.state);

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/orders").to_request()).await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri("/api/orders")
      .insert_header(bearer("not-a-jwt"))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_rt::test]
async fn checkout_over_http() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let token = app
    .state
    .auth
    .register(techstore::dto::auth::RegisterRequest {
      name: "Juan Pérez".to_string(),
      email: "juan@email.com".to_string(),
      password: TEST_PASSWORD.to_string(),
    })
    .await
    .unwrap()
    .token;
  let service = init_app!(app.state);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/orders/checkout")
      .insert_header(bearer(&token))
      .set_json(checkout_body(mouse.id, 3, "10.00"))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::OK);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], true);
  assert_eq!(body["order"]["totalAmount"], "133.80");
  assert_eq!(body["order"]["taxAmount"], "4.80");
  assert_eq!(body["order"]["status"], "CONFIRMED");
  assert_eq!(body["order"]["paymentInfo"]["paymentStatus"], "PAID");
  assert_eq!(body["order"]["items"][0]["quantity"], 3);
  let order_id = body["order"]["id"].as_str().unwrap().to_string();

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri("/api/orders/user")
      .insert_header(bearer(&token))
      .to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["orders"].as_array().map(Vec::len), Some(1));

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri(&format!("/api/orders/{}/cancel", order_id))
      .insert_header(bearer(&token))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_IMPLEMENTED);

  // Second checkout exceeds the remaining stock of 2
  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/orders/checkout")
      .insert_header(bearer(&token))
      .set_json(checkout_body(mouse.id, 3, "10.00"))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["available"], 2);
  assert_eq!(body["requested"], 3);
}

#[actix_rt::test]
async fn invalid_checkout_lists_field_errors() {
  let app = build_app();
  let user = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let token = app
    .state
    .auth
    .login(techstore::dto::auth::LoginRequest {
      email: user.email.clone(),
      password: TEST_PASSWORD.to_string(),
    })
    .await
    .unwrap()
    .token;
  let service = init_app!(app.state);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/orders/checkout")
      .insert_header(bearer(&token))
      .set_json(json!({ "cartItems": [], "shippingInfo": { "email": "not-an-email" } }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["success"], false);
  let fields = body["fields"].as_array().unwrap();
  assert!(!fields.is_empty());
  assert!(fields.iter().any(|f| f["field"] == "cartItems"));

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri("/api/orders/checkout")
      .insert_header(bearer(&token))
      .insert_header((header::CONTENT_TYPE, "application/json"))
      .set_payload("{ not json")
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn catalog_routes_and_admin_restock() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 0).await;
  add_product(&app.store, "Keyboard", "20.00", 50).await;
  let user = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let user_token = app.state.auth.refresh(&user).await.unwrap().token;
  let service = init_app!(app.state);

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/products").to_request()).await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body.as_array().map(Vec::len), Some(2));

  let resp = test::call_service(
    &service,
    test::TestRequest::get().uri("/api/products/search?query=mou").to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body[0]["name"], "Mouse");

  let resp = test::call_service(&service, test::TestRequest::get().uri("/api/products/out-of-stock").to_request()).await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body.as_array().map(Vec::len), Some(1));

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri(&format!("/api/products/{}/availability?quantity=1", mouse.id))
      .to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["available"], false);

  let resp = test::call_service(
    &service,
    test::TestRequest::post()
      .uri(&format!("/api/products/{}/restock", mouse.id))
      .insert_header(bearer(&user_token))
      .set_json(json!({ "quantity": 5 }))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::FORBIDDEN);

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri(&format!("/api/products/{}", uuid::Uuid::new_v4()))
      .to_request(),
  )
  .await;
  assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_rt::test]
async fn duplicate_review_is_a_conflict() {
  let app = build_app();
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let user = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let token = app.state.auth.refresh(&user).await.unwrap().token;
  let service = init_app!(app.state);

  let post_review = || {
    test::TestRequest::post()
      .uri("/api/reviews")
      .insert_header(bearer(&token))
      .set_json(json!({ "productId": mouse.id, "rating": 5, "comment": "Great" }))
      .to_request()
  };
  let resp = test::call_service(&service, post_review()).await;
  assert_eq!(resp.status(), StatusCode::CREATED);
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["userName"], "Juan Pérez");
  assert_eq!(body["isVerifiedPurchase"], false);

  let resp = test::call_service(&service, post_review()).await;
  assert_eq!(resp.status(), StatusCode::CONFLICT);

  let resp = test::call_service(
    &service,
    test::TestRequest::get()
      .uri(&format!("/api/reviews/product/{}/summary", mouse.id))
      .to_request(),
  )
  .await;
  let body: Value = test::read_body_json(resp).await;
  assert_eq!(body["totalReviews"], 1);
  assert_eq!(body["ratingDistribution"]["5"], 1);
}
