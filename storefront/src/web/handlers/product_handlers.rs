// storefront/src/web/handlers/product_handlers.rs

//! Public catalog routes. Only active products are ever visible here.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::services::catalog::{parse_catalog_query, CatalogQuery, ProductFilter};
use crate::state::AppState;
use crate::store::ProductStore;
use crate::web::responses;

#[derive(Deserialize, Debug)]
pub struct SearchQuery {
  pub q: Option<String>,
}

#[instrument(name = "handler::list_products", skip(app_state))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<CatalogQuery>,
) -> Result<HttpResponse, AppError> {
  let config = &app_state.config;
  let (mut filter, page) = parse_catalog_query(&query, config.default_page_size, config.max_page_size)?;
  filter.active = Some(true);

  let products = app_state.store.list_products(&filter, page).await?;
  info!(total = products.total, page = products.current_page, "Products listed.");
  Ok(responses::ok("Products retrieved successfully", products))
}

#[instrument(name = "handler::search_products", skip(app_state))]
pub async fn search_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<SearchQuery>,
) -> Result<HttpResponse, AppError> {
  let filter = ProductFilter::public_search(query.q.as_deref());
  let products = app_state.store.find_products(&filter).await?;
  info!(count = products.len(), "Product search completed.");
  Ok(responses::ok("Products retrieved successfully", products))
}

#[instrument(name = "handler::get_product", skip(app_state, path), fields(product_id = %path.as_ref()))]
pub async fn get_product_handler(
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match app_state.store.find_product(product_id).await? {
    Some(product) if product.active => Ok(responses::ok("Product retrieved successfully", product)),
    _ => {
      warn!("Product not found or inactive.");
      Err(AppError::NotFound("Product not found".to_string()))
    }
  }
}
