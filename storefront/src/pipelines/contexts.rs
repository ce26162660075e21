// storefront/src/pipelines/contexts.rs

//! Pipeline context data and the request payloads that seed them.
//! Handlers receive the contexts wrapped in `storefront_flow::ContextData`.

use crate::models::{Customer, IssuedToken, PendingToken, Principal};
use crate::state::AppState;
use serde::Deserialize;
use validator::Validate;

/// Customer profile plus password, as sent to `/customer/register` or `POST /admin/customers`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CustomerRegistration {
  #[validate(length(max = 255, message = "The fname field must not be greater than 255 characters."))]
  pub fname: String,
  #[validate(length(max = 255, message = "The lname field must not be greater than 255 characters."))]
  pub lname: String,
  #[validate(
    email(message = "The email field must be a valid email address."),
    length(max = 255, message = "The email field must not be greater than 255 characters.")
  )]
  pub email: String,
  #[validate(length(max = 20, message = "The contact field must not be greater than 20 characters."))]
  pub contact: String,
  #[validate(length(min = 8, message = "The password field must be at least 8 characters."))]
  pub password: String,
  pub password_confirmation: Option<String>,
  /// Honoured only for admin-created customers.
  pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct Credentials {
  #[validate(email(message = "The email field must be a valid email address."))]
  pub email: String,
  #[validate(length(min = 1, message = "The password field is required."))]
  pub password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOrigin {
  /// Self-registration: confirmed password, always active, issues a token.
  SelfService,
  /// Admin creation: no token, `active` may be set.
  Admin,
}

#[derive(Clone)]
pub struct RegistrationCtxData {
  pub app_state: AppState,
  pub origin: RegistrationOrigin,
  pub input: CustomerRegistration,
  pub password_hash: Option<String>,
  pub pending_token: Option<PendingToken>,
  pub issued_token: Option<IssuedToken>,
  pub customer: Option<Customer>,
}

impl RegistrationCtxData {
  pub fn new(app_state: AppState, origin: RegistrationOrigin, input: CustomerRegistration) -> Self {
    Self {
      app_state,
      origin,
      input,
      password_hash: None,
      pending_token: None,
      issued_token: None,
      customer: None,
    }
  }
}

/// Which account table a login is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginAudience {
  Customer,
  Staff,
}

#[derive(Clone)]
pub struct LoginCtxData {
  pub app_state: AppState,
  pub audience: LoginAudience,
  pub credentials: Credentials,
  pub account: Option<Principal>,
  pub issued_token: Option<IssuedToken>,
}

impl LoginCtxData {
  pub fn new(app_state: AppState, audience: LoginAudience, credentials: Credentials) -> Self {
    Self {
      app_state,
      audience,
      credentials,
      account: None,
      issued_token: None,
    }
  }
}
