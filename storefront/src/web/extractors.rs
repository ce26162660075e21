// storefront/src/web/extractors.rs

//! Bearer-token extractors. Each resolves the `Authorization` header through the
//! token store; the narrower ones add a capability check on the principal.

use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::errors::AppError;
use crate::models::{Capability, Customer, Principal, Session};
use crate::services::auth_service;
use crate::state::AppState;

/// Any authenticated principal.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Session);

/// A staff principal holding the administer capability.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

/// A customer principal, for the self-service profile routes.
#[derive(Debug, Clone)]
pub struct CustomerSession {
  pub customer: Customer,
  pub session: Session,
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
  let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
  let (scheme, token) = value.trim().split_once(' ')?;
  let token = token.trim();
  if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
    Some(token.to_string())
  } else {
    None
  }
}

fn resolve(req: &HttpRequest) -> LocalBoxFuture<'static, Result<Session, AppError>> {
  let state = req.app_data::<web::Data<AppState>>().cloned();
  let token = bearer_token(req);
  Box::pin(async move {
    let state = state.ok_or_else(|| AppError::Internal("Application state is not configured.".to_string()))?;
    let Some(token) = token else {
      warn!("Request without a bearer token.");
      return Err(AppError::Unauthorized("Unauthenticated.".to_string()));
    };
    auth_service::current_session(state.store.as_ref(), &token).await
  })
}

impl FromRequest for Authenticated {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let session = resolve(req);
    Box::pin(async move { session.await.map(Authenticated) })
  }
}

impl FromRequest for AdminSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let session = resolve(req);
    Box::pin(async move {
      let session = session.await?;
      if !session.principal.can(Capability::Administer) {
        warn!(account_id = %session.principal.id(), "Admin route refused.");
        return Err(AppError::Forbidden("Admin access required.".to_string()));
      }
      Ok(AdminSession(session))
    })
  }
}

impl FromRequest for CustomerSession {
  type Error = AppError;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let session = resolve(req);
    Box::pin(async move {
      let session = session.await?;
      let customer = match &session.principal {
        Principal::Customer(customer) if session.principal.can(Capability::ManageOwnProfile) => customer.clone(),
        _ => return Err(AppError::Forbidden("Customer access required.".to_string())),
      };
      Ok(CustomerSession { customer, session })
    })
  }
}
