// storefront/src/store/memory.rs

//! Process-local store used with `STORE_BACKEND=memory` and by the test suite.
//! Every operation takes the single lock once, so multi-row writes are atomic.

use super::{CustomerStore, ProductStore, Stats, TokenStore, UpdatedProduct, UserStore, EMAIL_TAKEN};
use crate::errors::{AppError, Result};
use crate::models::{
  AccessToken, AccountRef, Customer, CustomerChanges, NewCustomer, NewProduct, NewUser, PendingToken, Product,
  ProductChanges, User, UserChanges,
};
use crate::services::catalog::{Page, PageRequest, ProductFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
  // Vectors keep insertion order, which breaks created_at ties.
  products: Vec<Product>,
  customers: Vec<Customer>,
  users: Vec<User>,
  tokens: Vec<AccessToken>,
}

#[derive(Default)]
pub struct MemoryStore {
  tables: RwLock<Tables>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

// Newest first: reverse insertion order, then a stable sort on created_at.
fn newest_first<'a, T: 'a>(rows: impl DoubleEndedIterator<Item = &'a T>, created_at: fn(&T) -> DateTime<Utc>) -> Vec<&'a T> {
  let mut rows: Vec<&T> = rows.rev().collect();
  rows.sort_by(|a, b| created_at(b).cmp(&created_at(a)));
  rows
}

// Same folding as Postgres `LOWER()`, so both backends agree on uniqueness.
fn email_eq(a: &str, b: &str) -> bool {
  a.to_lowercase() == b.to_lowercase()
}

impl Tables {
  fn filtered_products(&self, filter: &ProductFilter) -> Vec<Product> {
    newest_first(self.products.iter().filter(|p| filter.matches(p)), |p| p.created_at)
      .into_iter()
      .cloned()
      .collect()
  }

  fn customer_email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
    self
      .customers
      .iter()
      .any(|c| email_eq(&c.email, email) && Some(c.id) != except)
  }

  fn user_email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
    self.users.iter().any(|u| email_eq(&u.email, email) && Some(u.id) != except)
  }

  fn push_token(&mut self, account: AccountRef, token: PendingToken) -> AccessToken {
    let row = AccessToken {
      id: Uuid::new_v4(),
      account_kind: account.kind,
      account_id: account.id,
      token_hash: token.token_hash,
      name: token.name,
      expires_at: token.expires_at,
      last_used_at: None,
      created_at: Utc::now(),
    };
    self.tokens.push(row.clone());
    row
  }

  fn drop_tokens_of(&mut self, account: AccountRef) {
    self.tokens.retain(|t| t.account() != account);
  }
}

#[async_trait]
impl ProductStore for MemoryStore {
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    let rows = self.tables.read().filtered_products(filter);
    Ok(Page::from_vec(rows, page))
  }

  async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    Ok(self.tables.read().filtered_products(filter))
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    Ok(self.tables.read().products.iter().find(|p| p.id == id).cloned())
  }

  async fn create_product(&self, product: NewProduct) -> Result<Product> {
    let row = Product::from_new(Uuid::new_v4(), product, Utc::now());
    self.tables.write().products.push(row.clone());
    Ok(row)
  }

  async fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Option<UpdatedProduct>> {
    let mut tables = self.tables.write();
    let Some(product) = tables.products.iter_mut().find(|p| p.id == id) else {
      return Ok(None);
    };
    let replaced_image = changes.apply(product, Utc::now());
    Ok(Some(UpdatedProduct {
      product: product.clone(),
      replaced_image,
    }))
  }

  async fn delete_product(&self, id: Uuid) -> Result<Option<Product>> {
    let mut tables = self.tables.write();
    let position = tables.products.iter().position(|p| p.id == id);
    Ok(position.map(|index| tables.products.remove(index)))
  }

  async fn product_stats(&self) -> Result<Stats> {
    let tables = self.tables.read();
    Ok(Stats {
      total: tables.products.len() as i64,
      active: tables.products.iter().filter(|p| p.active).count() as i64,
    })
  }
}

#[async_trait]
impl CustomerStore for MemoryStore {
  async fn list_customers(&self, page: PageRequest) -> Result<Page<Customer>> {
    let tables = self.tables.read();
    let rows = newest_first(tables.customers.iter(), |c| c.created_at)
      .into_iter()
      .cloned()
      .collect();
    Ok(Page::from_vec(rows, page))
  }

  async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>> {
    Ok(self.tables.read().customers.iter().find(|c| c.id == id).cloned())
  }

  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
    Ok(
      self
        .tables
        .read()
        .customers
        .iter()
        .find(|c| email_eq(&c.email, email))
        .cloned(),
    )
  }

  async fn customer_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
    Ok(self.tables.read().customer_email_taken(email, except))
  }

  async fn create_customer(
    &self,
    customer: NewCustomer,
    token: Option<PendingToken>,
  ) -> Result<(Customer, Option<AccessToken>)> {
    let mut tables = self.tables.write();
    if tables.customer_email_taken(&customer.email, None) {
      return Err(AppError::validation("email", EMAIL_TAKEN));
    }
    let row = Customer::from_new(Uuid::new_v4(), customer, Utc::now());
    tables.customers.push(row.clone());
    let issued = token.map(|t| tables.push_token(AccountRef::customer(row.id), t));
    Ok((row, issued))
  }

  async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<Customer>> {
    let mut tables = self.tables.write();
    if let Some(email) = &changes.email {
      if tables.customer_email_taken(email, Some(id)) {
        return Err(AppError::validation("email", EMAIL_TAKEN));
      }
    }
    let Some(customer) = tables.customers.iter_mut().find(|c| c.id == id) else {
      return Ok(None);
    };
    changes.apply(customer, Utc::now());
    Ok(Some(customer.clone()))
  }

  async fn delete_customer(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.customers.len();
    tables.customers.retain(|c| c.id != id);
    let removed = tables.customers.len() != before;
    if removed {
      tables.drop_tokens_of(AccountRef::customer(id));
    }
    Ok(removed)
  }

  async fn customer_stats(&self) -> Result<Stats> {
    let tables = self.tables.read();
    Ok(Stats {
      total: tables.customers.len() as i64,
      active: tables.customers.iter().filter(|c| c.active).count() as i64,
    })
  }
}

#[async_trait]
impl UserStore for MemoryStore {
  async fn list_users(&self, page: PageRequest) -> Result<Page<User>> {
    let tables = self.tables.read();
    let rows = newest_first(tables.users.iter(), |u| u.created_at)
      .into_iter()
      .cloned()
      .collect();
    Ok(Page::from_vec(rows, page))
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    Ok(self.tables.read().users.iter().find(|u| u.id == id).cloned())
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    Ok(self.tables.read().users.iter().find(|u| email_eq(&u.email, email)).cloned())
  }

  async fn user_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
    Ok(self.tables.read().user_email_taken(email, except))
  }

  async fn create_user(&self, user: NewUser) -> Result<User> {
    let mut tables = self.tables.write();
    if tables.user_email_taken(&user.email, None) {
      return Err(AppError::validation("email", EMAIL_TAKEN));
    }
    let row = User::from_new(Uuid::new_v4(), user, Utc::now());
    tables.users.push(row.clone());
    Ok(row)
  }

  async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
    let mut tables = self.tables.write();
    if tables.user_email_taken(&changes.email, Some(id)) {
      return Err(AppError::validation("email", EMAIL_TAKEN));
    }
    let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
      return Ok(None);
    };
    changes.apply(user, Utc::now());
    Ok(Some(user.clone()))
  }

  async fn set_user_status(&self, id: Uuid, status: bool) -> Result<Option<User>> {
    let mut tables = self.tables.write();
    let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
      return Ok(None);
    };
    user.status = status;
    user.updated_at = Utc::now();
    Ok(Some(user.clone()))
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.users.len();
    tables.users.retain(|u| u.id != id);
    let removed = tables.users.len() != before;
    if removed {
      tables.drop_tokens_of(AccountRef::staff(id));
    }
    Ok(removed)
  }
}

#[async_trait]
impl TokenStore for MemoryStore {
  async fn insert_token(&self, account: AccountRef, token: PendingToken) -> Result<AccessToken> {
    Ok(self.tables.write().push_token(account, token))
  }

  async fn find_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>> {
    Ok(
      self
        .tables
        .read()
        .tokens
        .iter()
        .find(|t| t.token_hash == token_hash)
        .cloned(),
    )
  }

  async fn touch_token(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<()> {
    if let Some(token) = self.tables.write().tokens.iter_mut().find(|t| t.id == id) {
      token.last_used_at = Some(used_at);
    }
    Ok(())
  }

  async fn delete_token(&self, id: Uuid) -> Result<bool> {
    let mut tables = self.tables.write();
    let before = tables.tokens.len();
    tables.tokens.retain(|t| t.id != id);
    Ok(tables.tokens.len() != before)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::AccountKind;
  use rust_decimal::Decimal;

  fn new_product(name: &str, active: bool) -> NewProduct {
    NewProduct {
      brand: "Acme".into(),
      name: name.into(),
      image: None,
      quantity: 1,
      cost_price: Decimal::ONE,
      sell_price: Decimal::TEN,
      description: None,
      rating: None,
      active,
    }
  }

  fn new_customer(email: &str) -> NewCustomer {
    NewCustomer {
      fname: "Cy".into(),
      lname: "Customer".into(),
      email: email.into(),
      contact: "555".into(),
      password_hash: "hash".into(),
      active: true,
    }
  }

  #[tokio::test]
  async fn listing_is_newest_first_even_on_timestamp_ties() {
    let store = MemoryStore::new();
    for name in ["first", "second", "third"] {
      store.create_product(new_product(name, true)).await.unwrap();
    }
    let page = store
      .list_products(&ProductFilter::default(), PageRequest { page: 1, per_page: 15 })
      .await
      .unwrap();
    let names: Vec<&str> = page.data.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["third", "second", "first"]);
  }

  #[tokio::test]
  async fn customer_creation_with_token_is_atomic_on_duplicate_email() {
    let store = MemoryStore::new();
    let token = PendingToken {
      token_hash: "abc".into(),
      name: "auth_token".into(),
      expires_at: None,
    };
    let (customer, issued) = store
      .create_customer(new_customer("a@example.com"), Some(token.clone()))
      .await
      .unwrap();
    let issued = issued.unwrap();
    assert_eq!(issued.account_kind, AccountKind::Customer);
    assert_eq!(issued.account_id, customer.id);

    let duplicate = store.create_customer(new_customer("A@example.com"), Some(token)).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));
    assert_eq!(store.tables.read().tokens.len(), 1);
  }

  #[tokio::test]
  async fn deleting_a_customer_drops_its_tokens() {
    let store = MemoryStore::new();
    let (customer, _) = store.create_customer(new_customer("a@example.com"), None).await.unwrap();
    store
      .insert_token(
        AccountRef::customer(customer.id),
        PendingToken {
          token_hash: "h".into(),
          name: "auth_token".into(),
          expires_at: None,
        },
      )
      .await
      .unwrap();
    assert!(store.delete_customer(customer.id).await.unwrap());
    assert!(store.find_token_by_hash("h").await.unwrap().is_none());
    assert!(!store.delete_customer(customer.id).await.unwrap());
  }

  #[tokio::test]
  async fn stats_count_active_rows() {
    let store = MemoryStore::new();
    store.create_product(new_product("on", true)).await.unwrap();
    store.create_product(new_product("off", false)).await.unwrap();
    assert_eq!(store.product_stats().await.unwrap(), Stats { total: 2, active: 1 });
  }

  #[tokio::test]
  async fn email_uniqueness_folds_non_ascii_case() {
    let store = MemoryStore::new();
    store.create_customer(new_customer("élodie@example.com"), None).await.unwrap();
    assert!(store.customer_email_taken("ÉLODIE@EXAMPLE.COM", None).await.unwrap());
    assert!(store.find_customer_by_email("Élodie@example.com").await.unwrap().is_some());
    let duplicate = store.create_customer(new_customer("ÉLODIE@example.com"), None).await;
    assert!(matches!(duplicate, Err(AppError::Validation(_))));
  }
}
