// storefront/src/pipelines/login_pipeline.rs

//! Email/password login shared by customers and staff. The audience decides which
//! account table is searched and how long the issued token lives.

use crate::errors::{AppError, FieldErrors, Result as AppResult};
use crate::models::{AccountRef, Principal};
use crate::pipelines::contexts::{LoginAudience, LoginCtxData};
use crate::services::auth_service;
use crate::store::{CustomerStore, UserStore};
use storefront_flow::{ContextData, FlowResult, Pipeline, PipelineControl};
use tracing::{info, instrument, warn};
use validator::Validate;

pub const PIPELINE_NAME: &str = "account_login";

pub fn build_login_pipeline() -> FlowResult<Pipeline<LoginCtxData, AppError>> {
  let mut pipeline = Pipeline::<LoginCtxData, AppError>::new(
    PIPELINE_NAME,
    &[
      ("validate_login_input", false, None),
      ("find_account", false, None),
      ("verify_password", false, None),
      ("check_account_active", false, None),
      ("issue_token", false, None),
    ],
  )?;

  pipeline.on("validate_login_input", validate_login_input)?;
  pipeline.on("find_account", find_account)?;
  pipeline.on("verify_password", verify_password)?;
  pipeline.on("check_account_active", check_account_active)?;
  pipeline.on("issue_token", issue_token)?;
  Ok(pipeline)
}

async fn validate_login_input(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let credentials = ctx_data.read().credentials.clone();
  let mut errors = FieldErrors::new();
  errors.require_present(&[("email", credentials.email.as_str()), ("password", credentials.password.as_str())]);
  if let Err(e) = credentials.validate() {
    errors.merge_unreported(FieldErrors::from(e));
  }
  errors.into_result()?;
  Ok(PipelineControl::Continue)
}

#[instrument(name = "login::find_account", skip_all, err(Display))]
async fn find_account(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (email, audience, store) = {
    let guard = ctx_data.read();
    (guard.credentials.email.clone(), guard.audience, guard.app_state.store.clone())
  };

  let account = match audience {
    LoginAudience::Customer => store.find_customer_by_email(&email).await?.map(Principal::Customer),
    LoginAudience::Staff => store.find_user_by_email(&email).await?.map(Principal::Staff),
  };
  let Some(account) = account else {
    warn!(?audience, "Login attempt for unknown email.");
    return Err(AppError::InvalidCredentials);
  };
  ctx_data.write().account = Some(account);
  Ok(PipelineControl::Continue)
}

async fn verify_password(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let matches = {
    let guard = ctx_data.read();
    let stored_hash = match &guard.account {
      Some(Principal::Customer(c)) => c.password_hash.as_str(),
      Some(Principal::Staff(u)) => u.password_hash.as_str(),
      None => return Err(AppError::Internal("Login account missing at verify step.".to_string())),
    };
    auth_service::verify_password(stored_hash, &guard.credentials.password)?
  };
  if !matches {
    warn!("Login attempt with wrong password.");
    return Err(AppError::InvalidCredentials);
  }
  Ok(PipelineControl::Continue)
}

// Runs only after the password matched, so a deactivated account is never
// reported as bad credentials.
async fn check_account_active(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let active = match &ctx_data.read().account {
    Some(Principal::Customer(c)) => c.active,
    Some(Principal::Staff(u)) => u.status,
    None => false,
  };
  if !active {
    warn!("Login rejected for deactivated account.");
    return Err(AppError::AccountDeactivated);
  }
  Ok(PipelineControl::Continue)
}

#[instrument(name = "login::issue_token", skip_all, err(Display))]
async fn issue_token(ctx_data: ContextData<LoginCtxData>) -> AppResult<PipelineControl> {
  let (account, store, ttl_hours, name) = {
    let guard = ctx_data.read();
    let account = match &guard.account {
      Some(Principal::Customer(c)) => AccountRef::customer(c.id),
      Some(Principal::Staff(u)) => AccountRef::staff(u.id),
      None => return Err(AppError::Internal("Login account missing at token step.".to_string())),
    };
    let config = &guard.app_state.config;
    let (ttl_hours, name) = match guard.audience {
      LoginAudience::Customer => (config.customer_token_ttl_hours, auth_service::CUSTOMER_TOKEN_NAME),
      LoginAudience::Staff => (config.staff_token_ttl_hours, auth_service::STAFF_TOKEN_NAME),
    };
    (account, guard.app_state.store.clone(), ttl_hours, name)
  };

  let issued = auth_service::issue_token(store.as_ref(), account, name, ttl_hours).await?;
  info!(account_id = %account.id, "Login succeeded.");
  ctx_data.write().issued_token = Some(issued);
  Ok(PipelineControl::Continue)
}
