// techstore/tests/checkout_flow.rs

mod common;

use common::*;
use techstore::errors::AppError;
use techstore::models::{OrderStatus, PaymentMethod, PaymentStatus};
use techstore::services::SimulatedGateway;

#[tokio::test]
async fn checkout_prices_order_and_decrements_stock() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let order = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 3, "10.00")], "CREDIT_CARD"))
    .await
    .unwrap();

  assert_eq!(order.subtotal, money("30.00"));
  assert_eq!(order.shipping_cost, money("99.00"));
  assert_eq!(order.tax_amount, money("4.80"));
  assert_eq!(order.total_amount, money("133.80"));
  assert_eq!(order.status, OrderStatus::Confirmed);
  assert_eq!(order.payment_info.payment_method, PaymentMethod::CreditCard);
  assert_eq!(order.payment_info.payment_status, PaymentStatus::Paid);
  assert!(order.payment_info.transaction_id.as_deref().is_some_and(|t| t.starts_with("TXN-")));
  assert!(order.order_number.starts_with("ORD-"));
  assert!(order.estimated_delivery.is_some());

  assert_eq!(order.items.len(), 1);
  assert_eq!(order.items[0].product_name, "Mouse");
  assert_eq!(order.items[0].total_price, money("30.00"));

  assert_eq!(stock_of(&app.store, mouse.id).await, 2);
}

#[tokio::test]
async fn insufficient_stock_persists_nothing() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let err = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 6, "10.00")], "CREDIT_CARD"))
    .await
    .unwrap_err();

  match err {
    AppError::InsufficientStock {
      product_id,
      available,
      requested,
      ..
    } => {
      assert_eq!(product_id, mouse.id);
      assert_eq!(available, 5);
      assert_eq!(requested, 6);
    }
    other => panic!("expected InsufficientStock, got {other:?}"),
  }
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn repeated_product_lines_are_checked_together() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let err = app
    .state
    .orders
    .create_order(
      &buyer,
      command(&[(mouse.id, 3, "10.00"), (mouse.id, 3, "10.00")], "PAYPAL"),
    )
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::InsufficientStock { requested: 6, .. }));
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
}

#[tokio::test]
async fn combined_quantity_overflow_is_rejected_without_side_effects() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let err = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, i32::MAX, "10.00"), (mouse.id, 1, "10.00")], "PAYPAL"))
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::Validation(_)), "got {err:?}");
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn oversized_price_is_rejected_without_side_effects() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let result = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 2, "70000000000000000000000000000")], "PAYPAL"))
    .await;

  assert!(matches!(result, Err(AppError::Validation(_))), "got {result:?}");
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn line_items_come_back_in_cart_order() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let webcam = add_product(&app.store, "Webcam", "49.99", 5).await;
  let cable = add_product(&app.store, "Cable HDMI", "9.99", 5).await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let created = app
    .state
    .orders
    .create_order(
      &buyer,
      command(&[(webcam.id, 1, "49.99"), (mouse.id, 1, "10.00"), (cable.id, 2, "9.99")], "PAYPAL"),
    )
    .await
    .unwrap();
  let expected = vec![webcam.id, mouse.id, cable.id];
  assert_eq!(created.items.iter().map(|i| i.product_id).collect::<Vec<_>>(), expected);

  let fetched = app.state.orders.get_order(&buyer, created.id).await.unwrap();
  assert_eq!(fetched.items.iter().map(|i| i.product_id).collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn failure_on_a_later_line_rolls_back_earlier_lines() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;
  let missing = uuid::Uuid::new_v4();

  let err = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 1, "10.00"), (missing, 1, "5.00")], "PAYPAL"))
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::ProductNotFound(id) if id == missing));
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_payment_method_rolls_back() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let err = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 2, "10.00")], "BITCOIN"))
    .await
    .unwrap_err();

  assert!(matches!(err, AppError::InvalidPaymentMethod(_)));
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn declined_payment_cancels_without_restock_by_default() {
  let app = build_app_with(SimulatedGateway::always_decline(), &[]);
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let order = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 3, "10.00")], "DEBIT_CARD"))
    .await
    .unwrap();

  assert_eq!(order.status, OrderStatus::Cancelled);
  assert_eq!(order.payment_info.payment_status, PaymentStatus::Failed);
  assert!(order.payment_info.transaction_id.is_none());
  assert_eq!(stock_of(&app.store, mouse.id).await, 2);

  // The cancelled order is persisted
  let fetched = app.state.orders.get_order(&buyer, order.id).await.unwrap();
  assert_eq!(fetched.status, OrderStatus::Cancelled);
}

#[tokio::test]
async fn declined_payment_restocks_when_enabled() {
  let app = build_app_with(
    SimulatedGateway::always_decline(),
    &[("RESTOCK_ON_PAYMENT_FAILURE", "true")],
  );
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let order = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 3, "10.00")], "DEBIT_CARD"))
    .await
    .unwrap();

  assert_eq!(order.status, OrderStatus::Cancelled);
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
}

#[tokio::test]
async fn client_price_is_used_unless_catalog_prices_are_enforced() {
  let trusting = build_app();
  let buyer = register(&trusting.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&trusting.store, "Mouse", "10.00", 5).await;
  let order = trusting
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 1, "1.00")], "PAYPAL"))
    .await
    .unwrap();
  assert_eq!(order.subtotal, money("1.00"));

  let strict = build_app_with(SimulatedGateway::always_approve(), &[("ENFORCE_CATALOG_PRICES", "true")]);
  let buyer = register(&strict.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&strict.store, "Mouse", "10.00", 5).await;
  let order = strict
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 1, "1.00")], "PAYPAL"))
    .await
    .unwrap();
  assert_eq!(order.subtotal, money("10.00"));
  assert_eq!(order.items[0].unit_price, money("10.00"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_checkouts_never_oversell() {
  let app = build_app();
  let first = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let second = register(&app.state, "María García", "maria@test.com").await;
  let monitor = add_product(&app.store, "Monitor", "799.99", 5).await;

  let spawn_checkout = |caller: techstore::models::AuthenticatedUser| {
    let orders = app.state.orders.clone();
    let cmd = command(&[(monitor.id, 3, "799.99")], "CREDIT_CARD");
    tokio::spawn(async move { orders.create_order(&caller, cmd).await })
  };
  let a = spawn_checkout(first);
  let b = spawn_checkout(second);
  let results = [a.await.unwrap(), b.await.unwrap()];

  let successes = results.iter().filter(|r| r.is_ok()).count();
  let shortfalls = results
    .iter()
    .filter(|r| matches!(r, Err(AppError::InsufficientStock { .. })))
    .count();
  assert_eq!(successes, 1);
  assert_eq!(shortfalls, 1);
  assert_eq!(stock_of(&app.store, monitor.id).await, 2);
}

#[tokio::test]
async fn failed_commit_surfaces_as_order_creation_failure() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  app.store.set_fail_on_commit(true);
  let err = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 2, "10.00")], "CREDIT_CARD"))
    .await
    .unwrap_err();
  app.store.set_fail_on_commit(false);

  assert!(matches!(err, AppError::OrderCreationFailed(_)));
  assert_eq!(stock_of(&app.store, mouse.id).await, 5);
  assert!(app.state.orders.orders_for_user(&buyer).await.unwrap().is_empty());
}

#[tokio::test]
async fn orders_are_private_to_their_owner() {
  let app = build_app();
  let owner = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let other = register(&app.state, "María García", "maria@test.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 5).await;

  let order = app
    .state
    .orders
    .create_order(&owner, command(&[(mouse.id, 1, "10.00")], "CASH_ON_DELIVERY"))
    .await
    .unwrap();

  assert_eq!(app.state.orders.get_order(&owner, order.id).await.unwrap().id, order.id);
  assert!(matches!(
    app.state.orders.get_order(&other, order.id).await,
    Err(AppError::OrderNotFound(_))
  ));
  assert!(app.state.orders.orders_for_user(&other).await.unwrap().is_empty());
  assert!(matches!(
    app.state.orders.cancel_order(&other, order.id).await,
    Err(AppError::OrderNotFound(_))
  ));
  assert!(matches!(
    app.state.orders.cancel_order(&owner, order.id).await,
    Err(AppError::NotImplemented(_))
  ));
}

#[tokio::test]
async fn order_history_is_newest_first() {
  let app = build_app();
  let buyer = register(&app.state, "Juan Pérez", "juan@email.com").await;
  let mouse = add_product(&app.store, "Mouse", "10.00", 10).await;

  let first = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 1, "10.00")], "PAYPAL"))
    .await
    .unwrap();
  let second = app
    .state
    .orders
    .create_order(&buyer, command(&[(mouse.id, 2, "10.00")], "PAYPAL"))
    .await
    .unwrap();

  let history = app.state.orders.orders_for_user(&buyer).await.unwrap();
  assert_eq!(history.len(), 2);
  assert_eq!(history[0].id, second.id);
  assert_eq!(history[1].id, first.id);
  assert!(first.order_number < second.order_number);
}
