// storefront/src/web/handlers/customer_handlers.rs

//! Customer self-service: registration, login, logout and profile.

use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use storefront_flow::{ContextData, PipelineResult};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{check_email, check_password, check_text, non_blank};
use crate::errors::{AppError, FieldErrors};
use crate::models::CustomerChanges;
use crate::pipelines::contexts::{
  Credentials, CustomerRegistration, LoginAudience, LoginCtxData, RegistrationCtxData, RegistrationOrigin,
};
use crate::services::auth_service;
use crate::state::AppState;
use crate::store::{CustomerStore, Repository, EMAIL_TAKEN};
use crate::web::extractors::CustomerSession;
use crate::web::json_body::JsonBody;
use crate::web::responses;

/// Partial customer update shared by the profile route and the admin route.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CustomerUpdatePayload {
  pub fname: Option<String>,
  pub lname: Option<String>,
  pub email: Option<String>,
  pub contact: Option<String>,
  pub password: Option<String>,
  pub password_confirmation: Option<String>,
  pub active: Option<bool>,
}

/// Validates a partial update and turns it into store changes, hashing any new password.
pub(crate) async fn customer_changes(
  store: &dyn Repository,
  customer_id: Uuid,
  payload: CustomerUpdatePayload,
  require_confirmation: bool,
) -> Result<CustomerChanges, AppError> {
  let mut errors = FieldErrors::new();
  check_text(&mut errors, "fname", payload.fname.as_deref(), 255);
  check_text(&mut errors, "lname", payload.lname.as_deref(), 255);
  check_text(&mut errors, "contact", payload.contact.as_deref(), 20);
  check_email(&mut errors, payload.email.as_deref());

  // A blank password means "keep the current one".
  let password = non_blank(payload.password);
  let confirmation = require_confirmation.then_some(payload.password_confirmation.as_deref());
  check_password(&mut errors, password.as_deref(), confirmation);

  if let Some(email) = payload.email.as_deref() {
    if !errors.contains("email") && store.customer_email_taken(email, Some(customer_id)).await? {
      errors.add("email", EMAIL_TAKEN);
    }
  }
  errors.into_result()?;

  let password_hash = password.as_deref().map(auth_service::hash_password).transpose()?;
  Ok(CustomerChanges {
    fname: payload.fname.map(|v| v.trim().to_string()),
    lname: payload.lname.map(|v| v.trim().to_string()),
    email: payload.email,
    contact: payload.contact.map(|v| v.trim().to_string()),
    password_hash,
    active: payload.active,
  })
}

/// Runs the registration pipeline and returns the created customer with its token, if one was minted.
pub(crate) async fn run_registration(
  app_state: &AppState,
  origin: RegistrationOrigin,
  input: CustomerRegistration,
) -> Result<RegistrationCtxData, AppError> {
  let ctx_data = ContextData::new(RegistrationCtxData::new(app_state.clone(), origin, input));
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .try_into_inner()
      .map_err(|_| AppError::Internal("Registration context still shared after completion.".to_string())),
    PipelineResult::Stopped => {
      warn!("Registration pipeline stopped before completion.");
      Err(AppError::Internal("Registration process was halted by an internal step.".to_string()))
    }
  }
}

/// Runs the login pipeline for the given audience.
pub(crate) async fn run_login(
  app_state: &AppState,
  audience: LoginAudience,
  credentials: Credentials,
) -> Result<LoginCtxData, AppError> {
  let ctx_data = ContextData::new(LoginCtxData::new(app_state.clone(), audience, credentials));
  match app_state.flows.run(ctx_data.clone()).await? {
    PipelineResult::Completed => ctx_data
      .try_into_inner()
      .map_err(|_| AppError::Internal("Login context still shared after completion.".to_string())),
    PipelineResult::Stopped => Err(AppError::Internal("Login process was halted by an internal step.".to_string())),
  }
}

#[instrument(name = "handler::customer_register", skip_all, fields(email = %payload.email))]
pub async fn register_handler(
  app_state: web::Data<AppState>,
  payload: JsonBody<CustomerRegistration>,
) -> Result<HttpResponse, AppError> {
  let outcome = run_registration(&app_state, RegistrationOrigin::SelfService, payload.into_inner()).await?;
  let (Some(customer), Some(token)) = (outcome.customer, outcome.issued_token) else {
    return Err(AppError::Internal("Registration completed without a customer or token.".to_string()));
  };

  info!(customer_id = %customer.id, "Customer registered.");
  Ok(responses::with_data(
    StatusCode::CREATED,
    "Customer registered successfully",
    json!({
        "customer": customer,
        "token": token.token,
        "token_type": token.token_type,
        "expires_at": token.expires_at,
    }),
  ))
}

#[instrument(name = "handler::customer_login", skip_all, fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: JsonBody<Credentials>,
) -> Result<HttpResponse, AppError> {
  let outcome = run_login(&app_state, LoginAudience::Customer, payload.into_inner()).await?;
  let (Some(account), Some(token)) = (outcome.account, outcome.issued_token) else {
    return Err(AppError::Internal("Login completed without an account or token.".to_string()));
  };

  Ok(responses::ok(
    "Login successful",
    json!({
        "customer": account,
        "token": token.token,
        "token_type": token.token_type,
        "expires_at": token.expires_at,
    }),
  ))
}

#[instrument(name = "handler::customer_logout", skip_all)]
pub async fn logout_handler(
  app_state: web::Data<AppState>,
  session: CustomerSession,
) -> Result<HttpResponse, AppError> {
  auth_service::logout(app_state.store.as_ref(), &session.session).await?;
  Ok(responses::message("Logged out successfully"))
}

#[instrument(name = "handler::customer_profile", skip_all, fields(customer_id = %session.customer.id))]
pub async fn profile_handler(session: CustomerSession) -> Result<HttpResponse, AppError> {
  Ok(responses::ok("Profile retrieved successfully", session.customer))
}

#[instrument(name = "handler::customer_update_profile", skip_all, fields(customer_id = %session.customer.id))]
pub async fn update_profile_handler(
  app_state: web::Data<AppState>,
  session: CustomerSession,
  payload: JsonBody<CustomerUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let mut payload = payload.into_inner();
  // Customers cannot reactivate or deactivate themselves.
  payload.active = None;

  let customer_id = session.customer.id;
  let changes = customer_changes(app_state.store.as_ref(), customer_id, payload, true).await?;
  let customer = app_state
    .store
    .update_customer(customer_id, changes)
    .await?
    .ok_or_else(|| AppError::NotFound("Customer not found".to_string()))?;

  info!("Profile updated.");
  Ok(responses::ok("Profile updated successfully", customer))
}
