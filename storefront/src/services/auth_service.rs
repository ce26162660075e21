// storefront/src/services/auth_service.rs

//! Password hashing plus the bearer-token lifecycle: minting, resolving and revoking.

use crate::errors::AppError;
use crate::models::{AccountKind, AccountRef, IssuedToken, PendingToken, Principal, Session};
use crate::store::{CustomerStore, Repository, TokenStore, UserStore};
use argon2::{
  password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
  Argon2,
};
use chrono::{Duration, Utc};
use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, instrument, warn};

/// Number of random bytes behind every bearer token.
pub const TOKEN_BYTES: usize = 32;

pub const CUSTOMER_TOKEN_NAME: &str = "customer_auth_token";
pub const STAFF_TOKEN_NAME: &str = "auth_token";

/// Hashes a plain-text password using Argon2.
#[instrument(name = "auth_service::hash_password", skip(password), err(Display))]
pub fn hash_password(password: &str) -> Result<String, AppError> {
  if password.is_empty() {
    error!("Password hashing failed: Password cannot be empty.");
    return Err(AppError::validation("password", "The password field is required."));
  }

  let salt = SaltString::generate(&mut OsRng);
  match Argon2::default().hash_password(password.as_bytes(), &salt) {
    Ok(password_hash) => {
      debug!("Password hashed successfully.");
      Ok(password_hash.to_string())
    }
    Err(argon_err) => {
      error!(error = %argon_err, "Argon2 password hashing failed.");
      Err(AppError::Internal(format!("Password hashing process failed: {}", argon_err)))
    }
  }
}

/// Verifies a plain-text password against a stored Argon2 hash.
///
/// Returns `Ok(false)` on a mismatch; a malformed stored hash is an internal error.
#[instrument(name = "auth_service::verify_password", skip_all, err(Display))]
pub fn verify_password(stored_hash: &str, provided_password: &str) -> Result<bool, AppError> {
  if provided_password.is_empty() {
    return Ok(false);
  }

  let parsed_hash = PasswordHash::new(stored_hash).map_err(|parse_err| {
    error!(error = %parse_err, "Failed to parse stored password hash string.");
    AppError::Internal(format!("Invalid stored password hash format: {}", parse_err))
  })?;

  match Argon2::default().verify_password(provided_password.as_bytes(), &parsed_hash) {
    Ok(()) => Ok(true),
    Err(argon2::password_hash::Error::Password) => {
      debug!("Password verification failed: Passwords do not match.");
      Ok(false)
    }
    Err(other_argon_err) => {
      error!(error = %other_argon_err, "Argon2 password verification process encountered an error.");
      Err(AppError::Internal(format!(
        "Password verification process failed: {}",
        other_argon_err
      )))
    }
  }
}

/// SHA-256 hex digest of a bearer value; this is what the token store indexes on.
pub fn hash_token(plain: &str) -> String {
  format!("{:x}", Sha256::digest(plain.as_bytes()))
}

/// Creates a fresh random token. The plain value goes to the client, the digest to the store.
pub fn mint_token(name: &str, ttl_hours: Option<i64>) -> Result<(IssuedToken, PendingToken), AppError> {
  let expires_at = match ttl_hours {
    None => None,
    Some(hours) => Some(
      Duration::try_hours(hours)
        .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        .ok_or_else(|| AppError::Config(format!("Token lifetime of {} hours is out of range", hours)))?,
    ),
  };
  let mut secret = [0_u8; TOKEN_BYTES];
  OsRng.fill_bytes(&mut secret);
  let plain = hex::encode(secret);

  let pending = PendingToken {
    token_hash: hash_token(&plain),
    name: name.to_string(),
    expires_at,
  };
  let issued = IssuedToken {
    token: plain,
    token_type: "Bearer",
    expires_at,
  };
  Ok((issued, pending))
}

/// Mints and persists a token for an existing account.
#[instrument(name = "auth_service::issue_token", skip(store), fields(kind = ?account.kind, account_id = %account.id))]
pub async fn issue_token(
  store: &dyn Repository,
  account: AccountRef,
  name: &str,
  ttl_hours: Option<i64>,
) -> Result<IssuedToken, AppError> {
  let (issued, pending) = mint_token(name, ttl_hours)?;
  store.insert_token(account, pending).await?;
  info!("Access token issued.");
  Ok(issued)
}

/// Resolves a bearer value to the account that owns it.
///
/// Unknown, expired or orphaned tokens are all `Unauthorized`. Expired rows are
/// removed on sight and a successful lookup stamps `last_used_at`.
#[instrument(name = "auth_service::current_session", skip_all)]
pub async fn current_session(store: &dyn Repository, bearer: &str) -> Result<Session, AppError> {
  let unauthenticated = || AppError::Unauthorized("Unauthenticated.".to_string());

  let token = store
    .find_token_by_hash(&hash_token(bearer))
    .await?
    .ok_or_else(unauthenticated)?;

  let now = Utc::now();
  if token.is_expired(now) {
    warn!(token_id = %token.id, "Expired access token presented; deleting it.");
    store.delete_token(token.id).await?;
    return Err(unauthenticated());
  }

  let principal = match token.account_kind {
    AccountKind::Customer => store.find_customer(token.account_id).await?.map(Principal::Customer),
    AccountKind::Staff => store.find_user(token.account_id).await?.map(Principal::Staff),
  };
  let Some(principal) = principal else {
    warn!(token_id = %token.id, "Access token refers to a missing account.");
    return Err(unauthenticated());
  };

  store.touch_token(token.id, now).await?;
  debug!(account_id = %principal.id(), "Bearer token resolved.");
  Ok(Session {
    principal,
    token_id: token.id,
  })
}

/// Revokes exactly the token that authenticated `session`.
#[instrument(name = "auth_service::logout", skip_all, fields(token_id = %session.token_id))]
pub async fn logout(store: &dyn Repository, session: &Session) -> Result<(), AppError> {
  if !store.delete_token(session.token_id).await? {
    // Another request already revoked it; the caller still ends up logged out.
    debug!("Token was already gone at logout.");
  }
  info!(account_id = %session.principal.id(), "Logged out.");
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hash_and_verify_roundtrip() {
    let hash = hash_password("correct horse").unwrap();
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "correct horse").unwrap());
    assert!(!verify_password(&hash, "wrong horse").unwrap());
    assert!(!verify_password(&hash, "").unwrap());
  }

  #[test]
  fn malformed_stored_hash_is_internal() {
    assert!(matches!(verify_password("not-a-hash", "pw"), Err(AppError::Internal(_))));
  }

  #[test]
  fn minted_tokens_store_only_the_digest() {
    let (issued, pending) = mint_token(STAFF_TOKEN_NAME, Some(48)).unwrap();
    assert_eq!(issued.token.len(), TOKEN_BYTES * 2);
    assert_ne!(pending.token_hash, issued.token);
    assert_eq!(pending.token_hash, hash_token(&issued.token));
    assert_eq!(pending.token_hash.len(), 64);
    assert_eq!(issued.expires_at, pending.expires_at);
    assert!(issued.expires_at.is_some());

    let (other, _) = mint_token(STAFF_TOKEN_NAME, None).unwrap();
    assert_ne!(other.token, issued.token);
    assert!(other.expires_at.is_none());
  }

  #[test]
  fn out_of_range_lifetime_is_an_error() {
    assert!(matches!(mint_token(STAFF_TOKEN_NAME, Some(9_000_000_000_000)), Err(AppError::Config(_))));
    assert!(matches!(mint_token(STAFF_TOKEN_NAME, Some(i64::MAX)), Err(AppError::Config(_))));
  }
}
