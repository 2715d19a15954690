// techstore/src/validation.rs

//! Input validation for request payloads. Each validator collects every failed
//! constraint into a list of [`FieldError`]s instead of stopping at the first one.

use regex::Regex;
use rust_decimal::Decimal;
use std::sync::LazyLock;

use crate::dto::auth::{LoginRequest, RegisterRequest};
use crate::dto::order::{CheckoutCommand, CheckoutLine, CheckoutRequest, ShippingAddress};
use crate::dto::review::ReviewRequest;
use crate::errors::{AppError, FieldError, Result as AppResult};
use crate::money::MAX_AMOUNT;

static EMAIL_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid"));
static PHONE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[+]?[0-9\-\s()]{10,20}$").expect("phone pattern is valid"));
static POSTAL_CODE_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[0-9]{5}(?:-[0-9]{4})?$").expect("postal code pattern is valid"));

pub const MAX_REVIEW_COMMENT: usize = 1000;
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn is_valid_email(email: &str) -> bool {
  EMAIL_RE.is_match(email)
}

#[derive(Default)]
struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
  fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
    self.0.push(FieldError::new(field, message));
  }

  fn required_text(&mut self, field: &str, value: &str, max_chars: usize) {
    if value.trim().is_empty() {
      self.push(field, "is required");
    } else if value.chars().count() > max_chars {
      self.push(field, format!("must be at most {} characters", max_chars));
    }
  }

  fn finish<T>(self, value: T) -> AppResult<T> {
    if self.0.is_empty() {
      Ok(value)
    } else {
      Err(AppError::InvalidPayload(self.0))
    }
  }
}

/// Checks a checkout payload and turns it into a [`CheckoutCommand`].
pub fn validate_checkout(request: CheckoutRequest) -> AppResult<CheckoutCommand> {
  let mut errors = FieldErrors::default();

  if request.cart_items.is_empty() {
    errors.push("cartItems", "must contain at least one item");
  }
  let mut lines = Vec::with_capacity(request.cart_items.len());
  for (idx, item) in request.cart_items.iter().enumerate() {
    let field = |name: &str| format!("cartItems[{}].{}", idx, name);
    if item.product_id.is_none() {
      errors.push(field("productId"), "is required");
    }
    match item.quantity {
      None => errors.push(field("quantity"), "is required"),
      Some(q) if q < 1 => errors.push(field("quantity"), "must be at least 1"),
      Some(_) => {}
    }
    match item.price {
      None => errors.push(field("price"), "is required"),
      Some(p) if p <= Decimal::ZERO => errors.push(field("price"), "must be greater than 0"),
      Some(p) if p > MAX_AMOUNT => errors.push(field("price"), format!("must be at most {}", MAX_AMOUNT)),
      Some(_) => {}
    }
    if let (Some(product_id), Some(quantity), Some(unit_price)) = (item.product_id, item.quantity, item.price) {
      lines.push(CheckoutLine {
        product_id,
        quantity,
        unit_price,
      });
    }
  }

  let shipping = match request.shipping_info {
    None => {
      errors.push("shippingInfo", "is required");
      None
    }
    Some(info) => {
      errors.required_text("shippingInfo.name", &info.name, 100);
      if info.email.trim().is_empty() {
        errors.push("shippingInfo.email", "is required");
      } else if !is_valid_email(info.email.trim()) {
        errors.push("shippingInfo.email", "must be a valid email address");
      }
      let phone = info.phone.filter(|p| !p.trim().is_empty());
      if let Some(phone) = &phone {
        if !PHONE_RE.is_match(phone) {
          errors.push("shippingInfo.phone", "must be a valid phone number");
        }
      }
      errors.required_text("shippingInfo.address", &info.address, 200);
      errors.required_text("shippingInfo.city", &info.city, 50);
      errors.required_text("shippingInfo.state", &info.state, 50);
      errors.required_text("shippingInfo.country", &info.country, 50);
      if info.postal_code.trim().is_empty() {
        errors.push("shippingInfo.postalCode", "is required");
      } else if !POSTAL_CODE_RE.is_match(&info.postal_code) {
        errors.push("shippingInfo.postalCode", "must be 5 digits with an optional -4 suffix");
      }
      Some(ShippingAddress {
        name: info.name.trim().to_string(),
        email: info.email.trim().to_string(),
        phone,
        address: info.address.trim().to_string(),
        city: info.city.trim().to_string(),
        state: info.state.trim().to_string(),
        postal_code: info.postal_code,
        country: info.country.trim().to_string(),
      })
    }
  };

  let (payment_method, claimed_total) = match request.payment_info {
    None => {
      errors.push("paymentInfo", "is required");
      (String::new(), Decimal::ZERO)
    }
    Some(info) => {
      if info.payment_method.trim().is_empty() {
        errors.push("paymentInfo.paymentMethod", "is required");
      }
      let total = match info.total_amount {
        None => {
          errors.push("paymentInfo.totalAmount", "is required");
          Decimal::ZERO
        }
        Some(t) if t <= Decimal::ZERO => {
          errors.push("paymentInfo.totalAmount", "must be greater than 0");
          t
        }
        Some(t) => t,
      };
      (info.payment_method.trim().to_string(), total)
    }
  };

  match shipping {
    Some(shipping) if errors.0.is_empty() => Ok(CheckoutCommand {
      lines,
      shipping,
      payment_method,
      claimed_total,
      notes: request.notes.filter(|n| !n.trim().is_empty()),
    }),
    _ => Err(AppError::InvalidPayload(errors.0)),
  }
}

/// A review payload that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidReview {
  pub product_id: Option<uuid::Uuid>,
  pub rating: i32,
  pub comment: Option<String>,
}

/// `require_product` is set for creation; updates address the review by id instead.
pub fn validate_review(request: &ReviewRequest, require_product: bool) -> AppResult<ValidReview> {
  let mut errors = FieldErrors::default();
  if require_product && request.product_id.is_none() {
    errors.push("productId", "is required");
  }
  let rating = match request.rating {
    None => {
      errors.push("rating", "is required");
      0
    }
    Some(r) if !(1..=5).contains(&r) => {
      errors.push("rating", "must be between 1 and 5");
      r
    }
    Some(r) => r,
  };
  let comment = request.comment.as_ref().map(|c| c.trim().to_string()).filter(|c| !c.is_empty());
  if let Some(c) = &comment {
    if c.chars().count() > MAX_REVIEW_COMMENT {
      errors.push("comment", format!("must be at most {} characters", MAX_REVIEW_COMMENT));
    }
  }
  errors.finish(ValidReview {
    product_id: request.product_id,
    rating,
    comment,
  })
}

pub fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
  let mut errors = FieldErrors::default();
  errors.required_text("name", &request.name, 100);
  if !is_valid_email(request.email.trim()) {
    errors.push("email", "must be a valid email address");
  }
  if request.password.chars().count() < MIN_PASSWORD_LEN {
    errors.push("password", format!("must be at least {} characters", MIN_PASSWORD_LEN));
  }
  errors.finish(())
}

pub fn validate_login(request: &LoginRequest) -> AppResult<()> {
  let mut errors = FieldErrors::default();
  if request.email.trim().is_empty() {
    errors.push("email", "is required");
  }
  if request.password.is_empty() {
    errors.push("password", "is required");
  }
  errors.finish(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dto::order::{CartItemPayload, PaymentInfoPayload, ShippingInfoPayload};
  use uuid::Uuid;

  fn valid_request() -> CheckoutRequest {
    CheckoutRequest {
      cart_items: vec![CartItemPayload {
        product_id: Some(Uuid::new_v4()),
        quantity: Some(2),
        price: Some(Decimal::new(1000, 2)),
      }],
      shipping_info: Some(ShippingInfoPayload {
        name: "Juan Perez".into(),
        email: "juan@email.com".into(),
        phone: Some("+52 (55) 1234-5678".into()),
        address: "Av. Reforma 123".into(),
        city: "CDMX".into(),
        state: "CDMX".into(),
        postal_code: "06600".into(),
        country: "Mexico".into(),
      }),
      payment_info: Some(PaymentInfoPayload {
        payment_method: "CREDIT_CARD".into(),
        total_amount: Some(Decimal::new(12320, 2)),
        ..Default::default()
      }),
      notes: Some("Leave at the door".into()),
    }
  }

  fn fields(err: AppError) -> Vec<String> {
    match err {
      AppError::InvalidPayload(list) => list.into_iter().map(|f| f.field).collect(),
      other => panic!("expected InvalidPayload, got {:?}", other),
    }
  }

  #[test]
  fn accepts_well_formed_checkout() {
    let command = validate_checkout(valid_request()).unwrap();
    assert_eq!(command.lines.len(), 1);
    assert_eq!(command.lines[0].quantity, 2);
    assert_eq!(command.payment_method, "CREDIT_CARD");
    assert_eq!(command.shipping.postal_code, "06600");
  }

  #[test]
  fn reports_every_bad_field() {
    let mut req = valid_request();
    req.cart_items[0].quantity = Some(0);
    req.cart_items[0].price = Some(Decimal::ZERO);
    if let Some(s) = req.shipping_info.as_mut() {
      s.email = "not-an-email".into();
      s.postal_code = "1234".into();
      s.city = String::new();
    }
    let got = fields(validate_checkout(req).unwrap_err());
    for expected in [
      "cartItems[0].quantity",
      "cartItems[0].price",
      "shippingInfo.email",
      "shippingInfo.postalCode",
      "shippingInfo.city",
    ] {
      assert!(got.iter().any(|f| f == expected), "missing {}", expected);
    }
  }

  #[test]
  fn empty_cart_and_missing_sections() {
    let got = fields(validate_checkout(CheckoutRequest::default()).unwrap_err());
    assert!(got.contains(&"cartItems".to_string()));
    assert!(got.contains(&"shippingInfo".to_string()));
    assert!(got.contains(&"paymentInfo".to_string()));
  }

  #[test]
  fn phone_is_optional_but_checked() {
    let mut req = valid_request();
    req.shipping_info.as_mut().unwrap().phone = None;
    assert!(validate_checkout(req).is_ok());

    let mut req = valid_request();
    req.shipping_info.as_mut().unwrap().phone = Some("12ab".into());
    assert_eq!(fields(validate_checkout(req).unwrap_err()), vec!["shippingInfo.phone"]);
  }

  #[test]
  fn zip_plus_four_is_accepted() {
    let mut req = valid_request();
    req.shipping_info.as_mut().unwrap().postal_code = "94105-1234".into();
    assert!(validate_checkout(req).is_ok());
  }

  #[test]
  fn price_beyond_money_column_is_rejected() {
    let mut req = valid_request();
    req.cart_items[0].price = Some("70000000000000000000000000000".parse().unwrap());
    assert_eq!(fields(validate_checkout(req).unwrap_err()), vec!["cartItems[0].price"]);

    let mut req = valid_request();
    req.cart_items[0].price = Some(MAX_AMOUNT);
    assert!(validate_checkout(req).is_ok());
  }

  #[test]
  fn unknown_payment_method_passes_input_validation() {
    // Mapping to the enumeration happens inside the checkout workflow
    let mut req = valid_request();
    req.payment_info.as_mut().unwrap().payment_method = "BITCOIN".into();
    assert!(validate_checkout(req).is_ok());
  }

  #[test]
  fn review_rating_bounds() {
    let ok = ReviewRequest {
      product_id: Some(Uuid::new_v4()),
      rating: Some(5),
      comment: Some("Great".into()),
    };
    assert!(validate_review(&ok, true).is_ok());
    let bad = ReviewRequest {
      rating: Some(6),
      comment: Some("x".repeat(MAX_REVIEW_COMMENT + 1)),
      ..ok.clone()
    };
    let got = fields(validate_review(&bad, true).unwrap_err());
    assert_eq!(got, vec!["rating", "comment"]);
    let no_product = ReviewRequest { product_id: None, ..ok };
    assert!(validate_review(&no_product, false).is_ok());
    assert!(validate_review(&no_product, true).is_err());
  }

  #[test]
  fn registration_rules() {
    let req = RegisterRequest {
      name: "Ana".into(),
      email: "ana@example.com".into(),
      password: "secret1".into(),
    };
    assert!(validate_registration(&req).is_ok());
    let weak = RegisterRequest {
      password: "123".into(),
      email: "ana".into(),
      ..req
    };
    assert_eq!(fields(validate_registration(&weak).unwrap_err()), vec!["email", "password"]);
  }
}
