// storefront/src/store/mod.rs

//! Persistence seams. Handlers and pipelines only ever see `Arc<dyn Repository>`;
//! the Postgres and in-memory backends both implement every store trait.

pub mod memory;
pub mod postgres;

use crate::errors::Result;
use crate::models::{
  AccessToken, AccountRef, Customer, CustomerChanges, NewCustomer, NewProduct, NewUser, PendingToken, Product,
  ProductChanges, User, UserChanges,
};
use crate::services::catalog::{Page, PageRequest, ProductFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub const EMAIL_TAKEN: &str = "The email has already been taken.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stats {
  pub total: i64,
  pub active: i64,
}

/// Result of a product update: the stored row and the image it no longer references.
#[derive(Debug, Clone)]
pub struct UpdatedProduct {
  pub product: Product,
  pub replaced_image: Option<String>,
}

#[async_trait]
pub trait ProductStore: Send + Sync {
  /// Filtered listing, newest first.
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>>;
  /// Unpaginated variant used by the search endpoint.
  async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>>;
  async fn find_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn create_product(&self, product: NewProduct) -> Result<Product>;
  async fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Option<UpdatedProduct>>;
  /// Removes the row and returns it so the caller can clean up its image.
  async fn delete_product(&self, id: Uuid) -> Result<Option<Product>>;
  async fn product_stats(&self) -> Result<Stats>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
  async fn list_customers(&self, page: PageRequest) -> Result<Page<Customer>>;
  async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>>;
  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>>;
  async fn customer_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool>;
  /// Inserts the customer and, when given, its first token in one atomic write.
  async fn create_customer(
    &self,
    customer: NewCustomer,
    token: Option<PendingToken>,
  ) -> Result<(Customer, Option<AccessToken>)>;
  async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<Customer>>;
  /// Deletes the customer together with its tokens.
  async fn delete_customer(&self, id: Uuid) -> Result<bool>;
  async fn customer_stats(&self) -> Result<Stats>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
  async fn list_users(&self, page: PageRequest) -> Result<Page<User>>;
  async fn find_user(&self, id: Uuid) -> Result<Option<User>>;
  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
  async fn user_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool>;
  async fn create_user(&self, user: NewUser) -> Result<User>;
  async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>>;
  async fn set_user_status(&self, id: Uuid, status: bool) -> Result<Option<User>>;
  /// Deletes the staff account together with its tokens.
  async fn delete_user(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
  async fn insert_token(&self, account: AccountRef, token: PendingToken) -> Result<AccessToken>;
  async fn find_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>>;
  async fn touch_token(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<()>;
  /// Returns whether a row was removed.
  async fn delete_token(&self, id: Uuid) -> Result<bool>;
}

/// Everything the application needs from persistence.
pub trait Repository: ProductStore + CustomerStore + UserStore + TokenStore {}

impl<T> Repository for T where T: ProductStore + CustomerStore + UserStore + TokenStore {}
