// storefront/src/store/postgres.rs

use super::{CustomerStore, ProductStore, Stats, TokenStore, UpdatedProduct, UserStore, EMAIL_TAKEN};
use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::models::{
  AccessToken, AccountRef, Customer, CustomerChanges, NewCustomer, NewProduct, NewUser, PendingToken, Product,
  ProductChanges, User, UserChanges,
};
use crate::services::catalog::{like_pattern, Page, PageRequest, ProductFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder, Transaction};
use tracing::{error, info, instrument};
use uuid::Uuid;

const PRODUCT_COLUMNS: &str =
  "id, brand, name, image, quantity, cost_price, sell_price, description, rating, active, created_at, updated_at";
const CUSTOMER_COLUMNS: &str = "id, fname, lname, email, contact, password_hash, active, created_at, updated_at";
const USER_COLUMNS: &str = "id, fname, lname, email, contact, password_hash, role, status, created_at, updated_at";
const TOKEN_COLUMNS: &str = "id, account_kind, account_id, token_hash, name, expires_at, last_used_at, created_at";

#[derive(Clone)]
pub struct PgStore {
  pool: PgPool,
}

impl PgStore {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }

  pub async fn connect(config: &AppConfig) -> Result<Self> {
    let url = config
      .database_url
      .as_deref()
      .ok_or_else(|| AppError::Config("DATABASE_URL is required for the postgres store".to_string()))?;
    let pool = PgPoolOptions::new()
      .max_connections(config.database_max_connections)
      .connect(url)
      .await
      .map_err(|e| {
        error!("Failed to create database pool: {}", e);
        AppError::Sqlx(e)
      })?;
    info!("Database connection pool established.");
    Ok(Self::new(pool))
  }

  pub async fn migrate(&self) -> Result<()> {
    sqlx::migrate!("./migrations").run(&self.pool).await?;
    info!("Database migrations applied.");
    Ok(())
  }
}

/// Unique-email violations surface as a field error, everything else as a database error.
fn email_conflict(err: sqlx::Error) -> AppError {
  if let sqlx::Error::Database(db_err) = &err {
    if db_err.is_unique_violation() {
      return AppError::validation("email", EMAIL_TAKEN);
    }
  }
  AppError::Sqlx(err)
}

fn push_product_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
  qb.push(" WHERE TRUE");
  if let Some(brand) = &filter.brand {
    qb.push(" AND brand ILIKE ").push_bind(like_pattern(brand));
  }
  if let Some(term) = &filter.search {
    let pattern = like_pattern(term);
    qb.push(" AND (name ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR brand ILIKE ")
      .push_bind(pattern.clone())
      .push(" OR description ILIKE ")
      .push_bind(pattern)
      .push(")");
  }
  if let Some(min_price) = filter.min_price {
    qb.push(" AND sell_price >= ").push_bind(min_price);
  }
  if let Some(max_price) = filter.max_price {
    qb.push(" AND sell_price <= ").push_bind(max_price);
  }
  if let Some(min_rating) = filter.min_rating {
    qb.push(" AND rating IS NOT NULL AND rating >= ").push_bind(min_rating);
  }
  if let Some(active) = filter.active {
    qb.push(" AND active = ").push_bind(active);
  }
}

fn select_products(filter: &ProductFilter) -> QueryBuilder<'static, Postgres> {
  let mut qb = QueryBuilder::new(format!("SELECT {} FROM products", PRODUCT_COLUMNS));
  push_product_filter(&mut qb, filter);
  qb.push(" ORDER BY created_at DESC, seq DESC");
  qb
}

async fn insert_token_tx(
  tx: &mut Transaction<'_, Postgres>,
  account: AccountRef,
  token: PendingToken,
) -> Result<AccessToken> {
  let row = sqlx::query_as::<_, AccessToken>(&format!(
    "INSERT INTO access_tokens (id, account_kind, account_id, token_hash, name, expires_at) \
     VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
    TOKEN_COLUMNS
  ))
  .bind(Uuid::new_v4())
  .bind(account.kind)
  .bind(account.id)
  .bind(token.token_hash)
  .bind(token.name)
  .bind(token.expires_at)
  .fetch_one(&mut **tx)
  .await?;
  Ok(row)
}

async fn stats(pool: &PgPool, table: &str, flag: &str) -> Result<Stats> {
  let (total, active): (i64, i64) = sqlx::query_as(&format!(
    "SELECT COUNT(*), COUNT(*) FILTER (WHERE {}) FROM {}",
    flag, table
  ))
  .fetch_one(pool)
  .await?;
  Ok(Stats { total, active })
}

async fn paged<T>(pool: &PgPool, table: &str, columns: &str, page: PageRequest) -> Result<Page<T>>
where
  T: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
{
  let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
    .fetch_one(pool)
    .await?;
  let rows = sqlx::query_as::<_, T>(&format!(
    "SELECT {} FROM {} ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    columns, table
  ))
  .bind(i64::from(page.per_page))
  .bind(page.offset() as i64)
  .fetch_all(pool)
  .await?;
  Ok(Page::new(rows, total.max(0) as u64, page))
}

#[async_trait]
impl ProductStore for PgStore {
  #[instrument(name = "pg::list_products", skip(self))]
  async fn list_products(&self, filter: &ProductFilter, page: PageRequest) -> Result<Page<Product>> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_product_filter(&mut count, filter);
    let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

    let mut select = select_products(filter);
    select
      .push(" LIMIT ")
      .push_bind(i64::from(page.per_page))
      .push(" OFFSET ")
      .push_bind(page.offset() as i64);
    let rows = select.build_query_as::<Product>().fetch_all(&self.pool).await?;
    Ok(Page::new(rows, total.max(0) as u64, page))
  }

  #[instrument(name = "pg::find_products", skip(self))]
  async fn find_products(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
    let mut select = select_products(filter);
    Ok(select.build_query_as::<Product>().fetch_all(&self.pool).await?)
  }

  async fn find_product(&self, id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn create_product(&self, product: NewProduct) -> Result<Product> {
    let row = sqlx::query_as::<_, Product>(&format!(
      "INSERT INTO products (id, brand, name, image, quantity, cost_price, sell_price, description, rating, active) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(product.brand)
    .bind(product.name)
    .bind(product.image)
    .bind(product.quantity)
    .bind(product.cost_price)
    .bind(product.sell_price)
    .bind(product.description)
    .bind(product.rating)
    .bind(product.active)
    .fetch_one(&self.pool)
    .await?;
    Ok(row)
  }

  async fn update_product(&self, id: Uuid, changes: ProductChanges) -> Result<Option<UpdatedProduct>> {
    let mut tx = self.pool.begin().await?;
    let current = sqlx::query_as::<_, Product>(&format!(
      "SELECT {} FROM products WHERE id = $1 FOR UPDATE",
      PRODUCT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(mut product) = current else {
      return Ok(None);
    };

    let replaced_image = changes.apply(&mut product, Utc::now());
    let row = sqlx::query_as::<_, Product>(&format!(
      "UPDATE products SET brand = $2, name = $3, image = $4, quantity = $5, cost_price = $6, sell_price = $7, \
       description = $8, rating = $9, active = $10, updated_at = $11 WHERE id = $1 RETURNING {}",
      PRODUCT_COLUMNS
    ))
    .bind(product.id)
    .bind(product.brand)
    .bind(product.name)
    .bind(product.image)
    .bind(product.quantity)
    .bind(product.cost_price)
    .bind(product.sell_price)
    .bind(product.description)
    .bind(product.rating)
    .bind(product.active)
    .bind(product.updated_at)
    .fetch_one(&mut *tx)
    .await?;
    tx.commit().await?;

    Ok(Some(UpdatedProduct {
      product: row,
      replaced_image,
    }))
  }

  async fn delete_product(&self, id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query_as::<_, Product>(&format!("DELETE FROM products WHERE id = $1 RETURNING {}", PRODUCT_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn product_stats(&self) -> Result<Stats> {
    stats(&self.pool, "products", "active").await
  }
}

#[async_trait]
impl CustomerStore for PgStore {
  async fn list_customers(&self, page: PageRequest) -> Result<Page<Customer>> {
    paged(&self.pool, "customers", CUSTOMER_COLUMNS, page).await
  }

  async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(&format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>> {
    let row = sqlx::query_as::<_, Customer>(&format!(
      "SELECT {} FROM customers WHERE LOWER(email) = LOWER($1)",
      CUSTOMER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  async fn customer_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
      "SELECT EXISTS(SELECT 1 FROM customers WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except)
    .fetch_one(&self.pool)
    .await?;
    Ok(taken)
  }

  #[instrument(name = "pg::create_customer", skip_all, fields(email = %customer.email))]
  async fn create_customer(
    &self,
    customer: NewCustomer,
    token: Option<PendingToken>,
  ) -> Result<(Customer, Option<AccessToken>)> {
    let mut tx = self.pool.begin().await?;
    let row = sqlx::query_as::<_, Customer>(&format!(
      "INSERT INTO customers (id, fname, lname, email, contact, password_hash, active) \
       VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {}",
      CUSTOMER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(customer.fname)
    .bind(customer.lname)
    .bind(customer.email)
    .bind(customer.contact)
    .bind(customer.password_hash)
    .bind(customer.active)
    .fetch_one(&mut *tx)
    .await
    .map_err(email_conflict)?;

    let issued = match token {
      Some(token) => Some(insert_token_tx(&mut tx, AccountRef::customer(row.id), token).await?),
      None => None,
    };
    // Dropping `tx` on any early return above rolls the customer back.
    tx.commit().await?;
    Ok((row, issued))
  }

  async fn update_customer(&self, id: Uuid, changes: CustomerChanges) -> Result<Option<Customer>> {
    let mut tx = self.pool.begin().await?;
    let current = sqlx::query_as::<_, Customer>(&format!(
      "SELECT {} FROM customers WHERE id = $1 FOR UPDATE",
      CUSTOMER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(mut customer) = current else {
      return Ok(None);
    };

    changes.apply(&mut customer, Utc::now());
    let row = sqlx::query_as::<_, Customer>(&format!(
      "UPDATE customers SET fname = $2, lname = $3, email = $4, contact = $5, password_hash = $6, active = $7, \
       updated_at = $8 WHERE id = $1 RETURNING {}",
      CUSTOMER_COLUMNS
    ))
    .bind(customer.id)
    .bind(customer.fname)
    .bind(customer.lname)
    .bind(customer.email)
    .bind(customer.contact)
    .bind(customer.password_hash)
    .bind(customer.active)
    .bind(customer.updated_at)
    .fetch_one(&mut *tx)
    .await
    .map_err(email_conflict)?;
    tx.commit().await?;
    Ok(Some(row))
  }

  async fn delete_customer(&self, id: Uuid) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    sqlx::query("DELETE FROM access_tokens WHERE account_kind = 'customer' AND account_id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;
    let deleted = sqlx::query("DELETE FROM customers WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?
      .rows_affected();
    tx.commit().await?;
    Ok(deleted > 0)
  }

  async fn customer_stats(&self) -> Result<Stats> {
    stats(&self.pool, "customers", "active").await
  }
}

#[async_trait]
impl UserStore for PgStore {
  async fn list_users(&self, page: PageRequest) -> Result<Page<User>> {
    paged(&self.pool, "users", USER_COLUMNS, page).await
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    Ok(row)
  }

  async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, User>(&format!(
      "SELECT {} FROM users WHERE LOWER(email) = LOWER($1)",
      USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  async fn user_email_taken(&self, email: &str, except: Option<Uuid>) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
      "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(email)
    .bind(except)
    .fetch_one(&self.pool)
    .await?;
    Ok(taken)
  }

  async fn create_user(&self, user: NewUser) -> Result<User> {
    let row = sqlx::query_as::<_, User>(&format!(
      "INSERT INTO users (id, fname, lname, email, contact, password_hash, role, status) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) RETURNING {}",
      USER_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(user.fname)
    .bind(user.lname)
    .bind(user.email)
    .bind(user.contact)
    .bind(user.password_hash)
    .bind(user.role)
    .fetch_one(&self.pool)
    .await
    .map_err(email_conflict)?;
    Ok(row)
  }

  async fn update_user(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, User>(&format!(
      "UPDATE users SET fname = $2, lname = $3, email = $4, contact = $5, role = $6, \
       password_hash = COALESCE($7, password_hash), updated_at = NOW() WHERE id = $1 RETURNING {}",
      USER_COLUMNS
    ))
    .bind(id)
    .bind(changes.fname)
    .bind(changes.lname)
    .bind(changes.email)
    .bind(changes.contact)
    .bind(changes.role)
    .bind(changes.password_hash)
    .fetch_optional(&self.pool)
    .await
    .map_err(email_conflict)?;
    Ok(row)
  }

  async fn set_user_status(&self, id: Uuid, status: bool) -> Result<Option<User>> {
    let row = sqlx::query_as::<_, User>(&format!(
      "UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
      USER_COLUMNS
    ))
    .bind(id)
    .bind(status)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  async fn delete_user(&self, id: Uuid) -> Result<bool> {
    let mut tx = self.pool.begin().await?;
    sqlx::query("DELETE FROM access_tokens WHERE account_kind = 'staff' AND account_id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?;
    let deleted = sqlx::query("DELETE FROM users WHERE id = $1")
      .bind(id)
      .execute(&mut *tx)
      .await?
      .rows_affected();
    tx.commit().await?;
    Ok(deleted > 0)
  }
}

#[async_trait]
impl TokenStore for PgStore {
  async fn insert_token(&self, account: AccountRef, token: PendingToken) -> Result<AccessToken> {
    let mut tx = self.pool.begin().await?;
    let row = insert_token_tx(&mut tx, account, token).await?;
    tx.commit().await?;
    Ok(row)
  }

  async fn find_token_by_hash(&self, token_hash: &str) -> Result<Option<AccessToken>> {
    let row = sqlx::query_as::<_, AccessToken>(&format!(
      "SELECT {} FROM access_tokens WHERE token_hash = $1",
      TOKEN_COLUMNS
    ))
    .bind(token_hash)
    .fetch_optional(&self.pool)
    .await?;
    Ok(row)
  }

  async fn touch_token(&self, id: Uuid, used_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE access_tokens SET last_used_at = $2 WHERE id = $1")
      .bind(id)
      .bind(used_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn delete_token(&self, id: Uuid) -> Result<bool> {
    let deleted = sqlx::query("DELETE FROM access_tokens WHERE id = $1")
      .bind(id)
      .execute(&self.pool)
      .await?
      .rows_affected();
    Ok(deleted > 0)
  }
}
