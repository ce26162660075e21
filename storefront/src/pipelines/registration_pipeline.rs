// storefront/src/pipelines/registration_pipeline.rs

//! Customer registration: validate, hash, optionally mint a token, then persist
//! the customer and its token in one atomic write.

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::NewCustomer;
use crate::pipelines::contexts::{RegistrationCtxData, RegistrationOrigin};
use crate::services::auth_service;
use crate::store::{CustomerStore, EMAIL_TAKEN};
use std::sync::Arc;
use storefront_flow::{ContextData, FlowResult, Pipeline, PipelineControl, SkipCondition};
use tracing::{event, info, instrument, Level};
use validator::Validate;

pub const PIPELINE_NAME: &str = "customer_registration";

pub fn build_registration_pipeline() -> FlowResult<Pipeline<RegistrationCtxData, AppError>> {
  let admin_created: SkipCondition<RegistrationCtxData> =
    Arc::new(|ctx: &RegistrationCtxData| ctx.origin == RegistrationOrigin::Admin);

  let mut pipeline = Pipeline::<RegistrationCtxData, AppError>::new(
    PIPELINE_NAME,
    &[
      ("validate_registration_input", false, None),
      ("hash_password", false, None),
      ("mint_token", false, Some(admin_created)),
      ("persist_customer", false, None),
    ],
  )?;

  pipeline.on("validate_registration_input", validate_registration_input)?;
  pipeline.on("hash_password", hash_password)?;
  pipeline.on("mint_token", mint_token)?;
  pipeline.on("persist_customer", persist_customer)?;
  Ok(pipeline)
}

#[instrument(name = "registration::validate_input", skip_all, err(Display))]
async fn validate_registration_input(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (input, origin, store) = {
    let guard = ctx_data.read();
    (guard.input.clone(), guard.origin, guard.app_state.store.clone())
  };

  let mut errors = FieldErrors::new();
  errors.require_present(&[
    ("fname", input.fname.as_str()),
    ("lname", input.lname.as_str()),
    ("email", input.email.as_str()),
    ("contact", input.contact.as_str()),
    ("password", input.password.as_str()),
  ]);
  if let Err(e) = input.validate() {
    errors.merge_unreported(FieldErrors::from(e));
  }
  if origin == RegistrationOrigin::SelfService
    && !input.password.is_empty()
    && input.password_confirmation.as_deref() != Some(input.password.as_str())
  {
    errors.add("password", "The password field confirmation does not match.");
  }
  if !errors.contains("email") && store.customer_email_taken(&input.email, None).await? {
    errors.add("email", EMAIL_TAKEN);
  }

  event!(Level::DEBUG, email = %input.email, valid = errors.is_empty(), "Registration input checked.");
  errors.into_result()?;
  Ok(PipelineControl::Continue)
}

async fn hash_password(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let password = ctx_data.read().input.password.clone();
  let hash = auth_service::hash_password(&password)?;
  ctx_data.write().password_hash = Some(hash);
  Ok(PipelineControl::Continue)
}

async fn mint_token(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let ttl_hours = ctx_data.read().app_state.config.customer_token_ttl_hours;
  let (issued, pending) = auth_service::mint_token(auth_service::CUSTOMER_TOKEN_NAME, ttl_hours)?;
  let mut guard = ctx_data.write();
  guard.issued_token = Some(issued);
  guard.pending_token = Some(pending);
  Ok(PipelineControl::Continue)
}

#[instrument(name = "registration::persist_customer", skip_all, err(Display))]
async fn persist_customer(ctx_data: ContextData<RegistrationCtxData>) -> AppResult<PipelineControl> {
  let (new_customer, pending_token, store) = {
    let mut guard = ctx_data.write();
    let password_hash = guard
      .password_hash
      .take()
      .ok_or_else(|| AppError::Internal("Password hash missing at persist step.".to_string()))?;
    let active = match guard.origin {
      RegistrationOrigin::SelfService => true,
      RegistrationOrigin::Admin => guard.input.active.unwrap_or(true),
    };
    let new_customer = NewCustomer {
      fname: guard.input.fname.clone(),
      lname: guard.input.lname.clone(),
      email: guard.input.email.clone(),
      contact: guard.input.contact.clone(),
      password_hash,
      active,
    };
    (new_customer, guard.pending_token.take(), guard.app_state.store.clone())
  };

  let (customer, token) = store.create_customer(new_customer, pending_token).await?;
  info!(customer_id = %customer.id, token_issued = token.is_some(), "Customer created.");
  ctx_data.write().customer = Some(customer);
  Ok(PipelineControl::Continue)
}
