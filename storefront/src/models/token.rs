// storefront/src/models/token.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Which account table a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "account_kind", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
  Customer,
  Staff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountRef {
  pub kind: AccountKind,
  pub id: Uuid,
}

impl AccountRef {
  pub fn customer(id: Uuid) -> Self {
    Self {
      kind: AccountKind::Customer,
      id,
    }
  }

  pub fn staff(id: Uuid) -> Self {
    Self {
      kind: AccountKind::Staff,
      id,
    }
  }
}

/// A persisted token row. Only the SHA-256 digest of the bearer value is stored.
#[derive(Debug, Clone, FromRow)]
pub struct AccessToken {
  pub id: Uuid,
  pub account_kind: AccountKind,
  pub account_id: Uuid,
  pub token_hash: String,
  pub name: String,
  pub expires_at: Option<DateTime<Utc>>,
  pub last_used_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
}

impl AccessToken {
  pub fn account(&self) -> AccountRef {
    AccountRef {
      kind: self.account_kind,
      id: self.account_id,
    }
  }

  pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
    self.expires_at.is_some_and(|expires_at| expires_at <= now)
  }
}

/// A token that has been minted but not yet written.
#[derive(Debug, Clone)]
pub struct PendingToken {
  pub token_hash: String,
  pub name: String,
  pub expires_at: Option<DateTime<Utc>>,
}

/// What the client receives once. The plain value is never stored.
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
  pub token: String,
  pub token_type: &'static str,
  pub expires_at: Option<DateTime<Utc>>,
}
