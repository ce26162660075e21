// storefront/src/models/principal.rs

use super::{Customer, User};
use crate::models::user::Role;
use serde::Serialize;
use uuid::Uuid;

/// Actions gated on the resolved principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
  Administer,
  ManageOwnProfile,
}

/// The account a bearer token resolved to.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Principal {
  Customer(Customer),
  Staff(User),
}

impl Principal {
  pub fn id(&self) -> Uuid {
    match self {
      Principal::Customer(c) => c.id,
      Principal::Staff(u) => u.id,
    }
  }

  pub fn can(&self, capability: Capability) -> bool {
    match (capability, self) {
      (Capability::Administer, Principal::Staff(user)) => user.role == Role::Admin && user.status,
      (Capability::ManageOwnProfile, Principal::Customer(_)) => true,
      _ => false,
    }
  }
}

/// A resolved principal plus the token that authenticated the request.
#[derive(Debug, Clone)]
pub struct Session {
  pub principal: Principal,
  pub token_id: Uuid,
}
