// storefront/src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Customer {
  pub id: Uuid,
  pub fname: String,
  pub lname: String,
  pub email: String,
  pub contact: String,
  #[serde(skip_serializing)]
  pub password_hash: String,
  pub active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCustomer {
  pub fname: String,
  pub lname: String,
  pub email: String,
  pub contact: String,
  pub password_hash: String,
  pub active: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerChanges {
  pub fname: Option<String>,
  pub lname: Option<String>,
  pub email: Option<String>,
  pub contact: Option<String>,
  pub password_hash: Option<String>,
  pub active: Option<bool>,
}

impl Customer {
  pub fn from_new(id: Uuid, new: NewCustomer, now: DateTime<Utc>) -> Self {
    Self {
      id,
      fname: new.fname,
      lname: new.lname,
      email: new.email,
      contact: new.contact,
      password_hash: new.password_hash,
      active: new.active,
      created_at: now,
      updated_at: now,
    }
  }
}

impl CustomerChanges {
  pub fn apply(self, customer: &mut Customer, now: DateTime<Utc>) {
    if let Some(fname) = self.fname {
      customer.fname = fname;
    }
    if let Some(lname) = self.lname {
      customer.lname = lname;
    }
    if let Some(email) = self.email {
      customer.email = email;
    }
    if let Some(contact) = self.contact {
      customer.contact = contact;
    }
    if let Some(password_hash) = self.password_hash {
      customer.password_hash = password_hash;
    }
    if let Some(active) = self.active {
      customer.active = active;
    }
    customer.updated_at = now;
  }
}
