// storefront/src/models/user.rs

//! Staff accounts. Only admins manage them; there is no self-registration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "staff_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
  User,
  Admin,
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Role::User => write!(f, "user"),
      Role::Admin => write!(f, "admin"),
    }
  }
}

impl std::str::FromStr for Role {
  type Err = ();

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "user" => Ok(Role::User),
      "admin" => Ok(Role::Admin),
      _ => Err(()),
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
  pub id: Uuid,
  pub fname: String,
  pub lname: String,
  pub email: String,
  pub contact: String,
  #[serde(skip_serializing)] // Never send password hash to client
  pub password_hash: String,
  pub role: Role,
  pub status: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
  pub fname: String,
  pub lname: String,
  pub email: String,
  pub contact: String,
  pub password_hash: String,
  pub role: Role,
}

/// Staff updates replace the profile wholesale; only the password is optional.
#[derive(Debug, Clone)]
pub struct UserChanges {
  pub fname: String,
  pub lname: String,
  pub email: String,
  pub contact: String,
  pub role: Role,
  pub password_hash: Option<String>,
}

impl User {
  pub fn from_new(id: Uuid, new: NewUser, now: DateTime<Utc>) -> Self {
    Self {
      id,
      fname: new.fname,
      lname: new.lname,
      email: new.email,
      contact: new.contact,
      password_hash: new.password_hash,
      role: new.role,
      status: true,
      created_at: now,
      updated_at: now,
    }
  }
}

impl UserChanges {
  pub fn apply(self, user: &mut User, now: DateTime<Utc>) {
    user.fname = self.fname;
    user.lname = self.lname;
    user.email = self.email;
    user.contact = self.contact;
    user.role = self.role;
    if let Some(password_hash) = self.password_hash {
      user.password_hash = password_hash;
    }
    user.updated_at = now;
  }
}
