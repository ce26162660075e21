// storefront/src/web/handlers/admin_customer_handlers.rs

use actix_web::{web, HttpResponse};
use tracing::{info, instrument};
use uuid::Uuid;

use super::customer_handlers::{customer_changes, run_registration, CustomerUpdatePayload};
use crate::errors::AppError;
use crate::models::CustomerChanges;
use crate::pipelines::contexts::{CustomerRegistration, RegistrationOrigin};
use crate::services::catalog::{PageQuery, PageRequest};
use crate::state::AppState;
use crate::store::CustomerStore;
use crate::web::extractors::AdminSession;
use crate::web::json_body::JsonBody;
use crate::web::responses;

fn not_found() -> AppError {
  AppError::NotFound("Customer not found".to_string())
}

#[instrument(name = "handler::admin_list_customers", skip(_admin, app_state))]
pub async fn list_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let config = &app_state.config;
  let page = PageRequest::from_raw(&query.page, &query.per_page, config.default_page_size, config.max_page_size)?;
  let customers = app_state.store.list_customers(page).await?;
  Ok(responses::ok("Customers retrieved successfully", customers))
}

#[instrument(name = "handler::admin_get_customer", skip(_admin, app_state))]
pub async fn get_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let customer = app_state.store.find_customer(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(responses::ok("Customer retrieved successfully", customer))
}

/// Admin creation goes through the registration pipeline without minting a token.
#[instrument(name = "handler::admin_create_customer", skip_all, fields(email = %payload.email))]
pub async fn create_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  payload: JsonBody<CustomerRegistration>,
) -> Result<HttpResponse, AppError> {
  let outcome = run_registration(&app_state, RegistrationOrigin::Admin, payload.into_inner()).await?;
  let customer = outcome
    .customer
    .ok_or_else(|| AppError::Internal("Registration completed without a customer.".to_string()))?;
  info!(customer_id = %customer.id, "Customer created by admin.");
  Ok(responses::created("Customer created successfully", customer))
}

#[instrument(name = "handler::admin_update_customer", skip(_admin, app_state, payload))]
pub async fn update_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: JsonBody<CustomerUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let customer_id = path.into_inner();
  let changes = customer_changes(app_state.store.as_ref(), customer_id, payload.into_inner(), false).await?;
  let customer = app_state
    .store
    .update_customer(customer_id, changes)
    .await?
    .ok_or_else(not_found)?;
  Ok(responses::ok("Customer updated successfully", customer))
}

#[instrument(name = "handler::admin_delete_customer", skip(_admin, app_state))]
pub async fn delete_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_customer(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(responses::message("Customer deleted successfully"))
}

async fn set_active(app_state: &AppState, id: Uuid, active: bool) -> Result<HttpResponse, AppError> {
  let changes = CustomerChanges {
    active: Some(active),
    ..Default::default()
  };
  let customer = app_state.store.update_customer(id, changes).await?.ok_or_else(not_found)?;
  let message = if active {
    "Customer activated successfully"
  } else {
    "Customer deactivated successfully"
  };
  Ok(responses::ok(message, customer))
}

#[instrument(name = "handler::admin_activate_customer", skip(_admin, app_state))]
pub async fn activate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  set_active(&app_state, path.into_inner(), true).await
}

#[instrument(name = "handler::admin_deactivate_customer", skip(_admin, app_state))]
pub async fn deactivate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  set_active(&app_state, path.into_inner(), false).await
}

#[instrument(name = "handler::admin_customer_stats", skip(_admin, app_state))]
pub async fn stats_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
  let stats = app_state.store.customer_stats().await?;
  Ok(responses::ok("Customer statistics retrieved successfully", stats))
}
