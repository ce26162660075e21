// storefront/src/web/handlers/admin_product_handlers.rs

//! Admin product CRUD. Image references are relative paths under `products/`;
//! replaced and deleted images are removed from disk best-effort.

use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{check_text, nullable};
use crate::errors::{AppError, FieldErrors};
use crate::models::{NewProduct, ProductChanges};
use crate::services::catalog::{parse_catalog_query, CatalogQuery};
use crate::services::image_store::{self, validate_reference};
use crate::state::AppState;
use crate::store::ProductStore;
use crate::web::extractors::AdminSession;
use crate::web::json_body::JsonBody;
use crate::web::responses;

// NUMERIC(10,2) upper bound.
const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateProductPayload {
  pub brand: Option<String>,
  pub name: Option<String>,
  pub image: Option<String>,
  pub quantity: Option<i64>,
  pub cost_price: Option<Decimal>,
  pub sell_price: Option<Decimal>,
  pub description: Option<String>,
  pub rating: Option<i64>,
  pub active: Option<bool>,
}

/// Absent fields stay untouched; `null` clears the nullable ones.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateProductPayload {
  pub brand: Option<String>,
  pub name: Option<String>,
  #[serde(deserialize_with = "nullable")]
  pub image: Option<Option<String>>,
  pub quantity: Option<i64>,
  pub cost_price: Option<Decimal>,
  pub sell_price: Option<Decimal>,
  #[serde(deserialize_with = "nullable")]
  pub description: Option<Option<String>>,
  #[serde(deserialize_with = "nullable")]
  pub rating: Option<Option<i64>>,
  pub active: Option<bool>,
}

fn required<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
  if value.is_none() {
    errors.add(field, format!("The {} field is required.", field));
  }
  value
}

fn check_quantity(errors: &mut FieldErrors, quantity: Option<i64>) -> Option<i32> {
  let quantity = quantity?;
  match i32::try_from(quantity) {
    Ok(q) if q >= 0 => Some(q),
    Ok(_) => {
      errors.add("quantity", "The quantity field must be at least 0.");
      None
    }
    Err(_) => {
      errors.add("quantity", "The quantity field is too large.");
      None
    }
  }
}

fn check_price(errors: &mut FieldErrors, field: &str, price: Option<Decimal>) -> Option<Decimal> {
  let price = price?.round_dp(2);
  if price < Decimal::ZERO {
    errors.add(field, format!("The {} field must be at least 0.", field));
    None
  } else if price > MAX_PRICE {
    errors.add(field, format!("The {} field must not be greater than {}.", field, MAX_PRICE));
    None
  } else {
    Some(price)
  }
}

fn check_rating(errors: &mut FieldErrors, rating: Option<i64>) -> Option<i16> {
  let rating = rating?;
  if (1..=5).contains(&rating) {
    Some(rating as i16)
  } else {
    errors.add("rating", "The rating field must be between 1 and 5.");
    None
  }
}

fn check_image(errors: &mut FieldErrors, image: Option<&str>) {
  if let Some(reference) = image {
    if let Err(message) = validate_reference(reference) {
      errors.add("image", message);
    }
  }
}

impl CreateProductPayload {
  /// Validates the whole payload; no relation between cost and sell price is enforced.
  pub fn into_new_product(self) -> Result<NewProduct, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "brand", self.brand.as_deref(), 255);
    check_text(&mut errors, "name", self.name.as_deref(), 255);
    check_image(&mut errors, self.image.as_deref());
    let brand = required(&mut errors, "brand", self.brand);
    let name = required(&mut errors, "name", self.name);
    let quantity = required(&mut errors, "quantity", self.quantity);
    let quantity = check_quantity(&mut errors, quantity);
    let cost_price = required(&mut errors, "cost_price", self.cost_price);
    let cost_price = check_price(&mut errors, "cost_price", cost_price);
    let sell_price = required(&mut errors, "sell_price", self.sell_price);
    let sell_price = check_price(&mut errors, "sell_price", sell_price);
    let rating = check_rating(&mut errors, self.rating);

    match (brand, name, quantity, cost_price, sell_price) {
      (Some(brand), Some(name), Some(quantity), Some(cost_price), Some(sell_price)) if errors.is_empty() => {
        Ok(NewProduct {
          brand: brand.trim().to_string(),
          name: name.trim().to_string(),
          image: self.image,
          quantity,
          cost_price,
          sell_price,
          description: self.description,
          rating,
          active: self.active.unwrap_or(true),
        })
      }
      _ => Err(errors),
    }
  }
}

impl UpdateProductPayload {
  pub fn into_changes(self) -> Result<ProductChanges, FieldErrors> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "brand", self.brand.as_deref(), 255);
    check_text(&mut errors, "name", self.name.as_deref(), 255);
    check_image(&mut errors, self.image.as_ref().and_then(|i| i.as_deref()));
    let quantity = check_quantity(&mut errors, self.quantity);
    let cost_price = check_price(&mut errors, "cost_price", self.cost_price);
    let sell_price = check_price(&mut errors, "sell_price", self.sell_price);
    let rating = match self.rating {
      None => None,
      Some(None) => Some(None),
      Some(Some(rating)) => check_rating(&mut errors, Some(rating)).map(Some),
    };
    if !errors.is_empty() {
      return Err(errors);
    }

    Ok(ProductChanges {
      brand: self.brand.map(|b| b.trim().to_string()),
      name: self.name.map(|n| n.trim().to_string()),
      image: self.image,
      quantity,
      cost_price,
      sell_price,
      description: self.description,
      rating,
      active: self.active,
    })
  }
}

fn not_found() -> AppError {
  AppError::NotFound("Product not found".to_string())
}

/// Admin listing honours every catalog filter, including `active`.
#[instrument(name = "handler::admin_list_products", skip(_admin, app_state))]
pub async fn list_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, AppError> {
  let config = &app_state.config;
  let (filter, page) = parse_catalog_query(&query, config.default_page_size, config.max_page_size)?;
  let products = app_state.store.list_products(&filter, page).await?;
  Ok(responses::ok("Products retrieved successfully", products))
}

#[instrument(name = "handler::admin_get_product", skip(_admin, app_state))]
pub async fn get_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.store.find_product(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(responses::ok("Product retrieved successfully", product))
}

#[instrument(name = "handler::admin_create_product", skip_all)]
pub async fn create_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  payload: JsonBody<CreateProductPayload>,
) -> Result<HttpResponse, AppError> {
  let new_product = payload.into_inner().into_new_product()?;
  let product = app_state.store.create_product(new_product).await?;
  info!(product_id = %product.id, "Product created.");
  Ok(responses::created("Product created successfully", product))
}

#[instrument(name = "handler::admin_update_product", skip(_admin, app_state, payload))]
pub async fn update_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: JsonBody<UpdateProductPayload>,
) -> Result<HttpResponse, AppError> {
  let changes = payload.into_inner().into_changes()?;
  let product_id = path.into_inner();
  if changes.is_empty() {
    let product = app_state.store.find_product(product_id).await?.ok_or_else(not_found)?;
    return Ok(responses::ok("Product updated successfully", product));
  }
  let updated = app_state
    .store
    .update_product(product_id, changes)
    .await?
    .ok_or_else(not_found)?;

  if let Some(previous) = updated.replaced_image.as_deref() {
    image_store::discard(app_state.images.as_ref(), previous).await;
  }
  info!(product_id = %updated.product.id, "Product updated.");
  Ok(responses::ok("Product updated successfully", updated.product))
}

#[instrument(name = "handler::admin_delete_product", skip(_admin, app_state))]
pub async fn delete_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product = app_state.store.delete_product(path.into_inner()).await?.ok_or_else(not_found)?;
  if let Some(image) = product.image.as_deref() {
    image_store::discard(app_state.images.as_ref(), image).await;
  }
  info!(product_id = %product.id, "Product deleted.");
  Ok(responses::message("Product deleted successfully"))
}

async fn set_active(app_state: &AppState, id: Uuid, active: bool) -> Result<HttpResponse, AppError> {
  let changes = ProductChanges {
    active: Some(active),
    ..Default::default()
  };
  let updated = app_state.store.update_product(id, changes).await?.ok_or_else(not_found)?;
  let message = if active {
    "Product activated successfully"
  } else {
    "Product deactivated successfully"
  };
  Ok(responses::ok(message, updated.product))
}

#[instrument(name = "handler::admin_activate_product", skip(_admin, app_state))]
pub async fn activate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  set_active(&app_state, path.into_inner(), true).await
}

#[instrument(name = "handler::admin_deactivate_product", skip(_admin, app_state))]
pub async fn deactivate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  set_active(&app_state, path.into_inner(), false).await
}

#[instrument(name = "handler::admin_product_stats", skip(_admin, app_state))]
pub async fn stats_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
  let stats = app_state.store.product_stats().await?;
  Ok(responses::ok("Product statistics retrieved successfully", stats))
}
