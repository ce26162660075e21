// storefront/src/web/handlers/staff_handlers.rs

//! Staff session routes: login, logout and the current principal.

use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::instrument;

use super::customer_handlers::run_login;
use crate::errors::AppError;
use crate::pipelines::contexts::{Credentials, LoginAudience};
use crate::services::auth_service;
use crate::state::AppState;
use crate::web::extractors::Authenticated;
use crate::web::json_body::JsonBody;
use crate::web::responses;

#[instrument(name = "handler::staff_login", skip_all, fields(email = %payload.email))]
pub async fn login_handler(
  app_state: web::Data<AppState>,
  payload: JsonBody<Credentials>,
) -> Result<HttpResponse, AppError> {
  let outcome = run_login(&app_state, LoginAudience::Staff, payload.into_inner()).await?;
  let (Some(account), Some(token)) = (outcome.account, outcome.issued_token) else {
    return Err(AppError::Internal("Login completed without an account or token.".to_string()));
  };

  Ok(responses::ok(
    "Login successful",
    json!({
        "user": account,
        "token": token.token,
        "token_type": token.token_type,
        "expires_at": token.expires_at,
    }),
  ))
}

/// Revokes the presented token, whichever kind of account owns it.
#[instrument(name = "handler::logout", skip_all)]
pub async fn logout_handler(app_state: web::Data<AppState>, auth: Authenticated) -> Result<HttpResponse, AppError> {
  let Authenticated(session) = auth;
  auth_service::logout(app_state.store.as_ref(), &session).await?;
  Ok(responses::message("Logged out successfully"))
}

#[instrument(name = "handler::current_principal", skip_all)]
pub async fn current_principal_handler(auth: Authenticated) -> Result<HttpResponse, AppError> {
  let Authenticated(session) = auth;
  Ok(responses::ok("Authenticated principal", session.principal))
}
