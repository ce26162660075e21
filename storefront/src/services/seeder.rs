// storefront/src/services/seeder.rs

use crate::errors::Result;
use crate::models::{NewUser, Role, User};
use crate::services::auth_service;
use crate::store::{Repository, UserStore};
use tracing::{info, instrument};

/// Ensures an admin account exists for `email`. Existing accounts are left untouched.
#[instrument(name = "seeder::seed_admin", skip(store, password))]
pub async fn seed_admin(store: &dyn Repository, email: &str, password: &str) -> Result<Option<User>> {
  if store.find_user_by_email(email).await?.is_some() {
    info!("Admin account already present; skipping seed.");
    return Ok(None);
  }
  let user = store
    .create_user(NewUser {
      fname: "Admin".to_string(),
      lname: "User".to_string(),
      email: email.to_string(),
      contact: "0000000000".to_string(),
      password_hash: auth_service::hash_password(password)?,
      role: Role::Admin,
    })
    .await?;
  info!(user_id = %user.id, "Admin account seeded.");
  Ok(Some(user))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::store::MemoryStore;

  #[tokio::test]
  async fn seeding_is_idempotent() {
    let store = MemoryStore::new();
    let first = seed_admin(&store, "admin@example.com", "secret-password").await.unwrap();
    let admin = first.unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert!(admin.status);
    assert!(auth_service::verify_password(&admin.password_hash, "secret-password").unwrap());

    let second = seed_admin(&store, "admin@example.com", "other-password").await.unwrap();
    assert!(second.is_none());
  }
}
