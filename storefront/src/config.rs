// storefront/src/config.rs

use crate::errors::{AppError, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Where accounts, products and tokens are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
  Postgres,
  Memory,
}

impl FromStr for StoreBackend {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
      "memory" => Ok(StoreBackend::Memory),
      other => Err(AppError::Config(format!(
        "Invalid STORE_BACKEND '{}': expected 'postgres' or 'memory'",
        other
      ))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Text,
  Json,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,

  pub store_backend: StoreBackend,
  pub database_url: Option<String>,
  pub database_max_connections: u32,
  pub run_migrations: bool,

  /// Root directory of the public disk; image references are relative to it.
  pub image_root: PathBuf,

  pub default_page_size: u32,
  pub max_page_size: u32,

  pub staff_token_ttl_hours: Option<i64>,
  pub customer_token_ttl_hours: Option<i64>,

  pub seed_db: bool,
  pub seed_admin_email: String,
  pub seed_admin_password: Option<String>,

  pub log_format: LogFormat,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      server_host: "127.0.0.1".to_string(),
      server_port: 8080,
      store_backend: StoreBackend::Postgres,
      database_url: None,
      database_max_connections: 5,
      run_migrations: false,
      image_root: PathBuf::from("storage/public"),
      default_page_size: 15,
      max_page_size: 100,
      staff_token_ttl_hours: Some(48),
      customer_token_ttl_hours: None,
      seed_db: false,
      seed_admin_email: "admin@example.com".to_string(),
      seed_admin_password: None,
      log_format: LogFormat::Text,
    }
  }
}

impl AppConfig {
  /// Loads `.env` (when present) and then reads the process environment.
  pub fn from_env() -> Result<Self> {
    dotenvy::dotenv().ok();
    Self::from_lookup(|key| env::var(key).ok())
  }

  /// Builds the configuration from any key lookup. Unset or blank keys take their defaults.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
    let defaults = Self::default();

    let store_backend = match get("STORE_BACKEND") {
      Some(raw) => raw.parse()?,
      None => defaults.store_backend,
    };
    let database_url = get("DATABASE_URL");
    if store_backend == StoreBackend::Postgres && database_url.is_none() {
      return Err(AppError::Config(
        "Missing environment variable 'DATABASE_URL' (required by the postgres store)".to_string(),
      ));
    }

    let seed_db = parse_or(get("SEED_DB"), "SEED_DB", parse_flag, defaults.seed_db)?;
    let seed_admin_password = get("SEED_ADMIN_PASSWORD");
    if seed_db && seed_admin_password.is_none() {
      return Err(AppError::Config(
        "SEED_DB is enabled but SEED_ADMIN_PASSWORD is not set".to_string(),
      ));
    }

    let default_page_size = parse_or(get("DEFAULT_PAGE_SIZE"), "DEFAULT_PAGE_SIZE", parse_num, defaults.default_page_size)?;
    let max_page_size = parse_or(get("MAX_PAGE_SIZE"), "MAX_PAGE_SIZE", parse_num, defaults.max_page_size)?;
    if default_page_size == 0 || max_page_size < default_page_size {
      return Err(AppError::Config(format!(
        "Invalid page sizes: DEFAULT_PAGE_SIZE={} MAX_PAGE_SIZE={}",
        default_page_size, max_page_size
      )));
    }

    let log_format = match get("LOG_FORMAT").as_deref().map(str::to_ascii_lowercase).as_deref() {
      None | Some("text") => LogFormat::Text,
      Some("json") => LogFormat::Json,
      Some(other) => return Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    };

    let config = Self {
      server_host: get("SERVER_HOST").unwrap_or(defaults.server_host),
      server_port: parse_or(get("SERVER_PORT"), "SERVER_PORT", parse_num, defaults.server_port)?,
      store_backend,
      database_url,
      database_max_connections: parse_or(
        get("DATABASE_MAX_CONNECTIONS"),
        "DATABASE_MAX_CONNECTIONS",
        parse_num,
        defaults.database_max_connections,
      )?,
      run_migrations: parse_or(get("RUN_MIGRATIONS"), "RUN_MIGRATIONS", parse_flag, defaults.run_migrations)?,
      image_root: get("IMAGE_ROOT").map(PathBuf::from).unwrap_or(defaults.image_root),
      default_page_size,
      max_page_size,
      staff_token_ttl_hours: parse_ttl(get("STAFF_TOKEN_TTL_HOURS"), "STAFF_TOKEN_TTL_HOURS", defaults.staff_token_ttl_hours)?,
      customer_token_ttl_hours: parse_ttl(
        get("CUSTOMER_TOKEN_TTL_HOURS"),
        "CUSTOMER_TOKEN_TTL_HOURS",
        defaults.customer_token_ttl_hours,
      )?,
      seed_db,
      seed_admin_email: get("SEED_ADMIN_EMAIL").unwrap_or(defaults.seed_admin_email),
      seed_admin_password,
      log_format,
    };

    tracing::info!(
      backend = ?config.store_backend,
      host = %config.server_host,
      port = config.server_port,
      "Application configuration loaded successfully."
    );
    Ok(config)
  }
}

fn parse_or<T>(raw: Option<String>, key: &str, parse: fn(&str) -> Option<T>, default: T) -> Result<T> {
  match raw {
    None => Ok(default),
    Some(value) => parse(&value).ok_or_else(|| AppError::Config(format!("Invalid {} value: '{}'", key, value))),
  }
}

fn parse_num<T: FromStr>(value: &str) -> Option<T> {
  value.parse().ok()
}

fn parse_flag(value: &str) -> Option<bool> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "1" | "yes" => Some(true),
    "false" | "0" | "no" => Some(false),
    _ => None,
  }
}

/// Longest token lifetime accepted from the environment (ten years).
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365 * 10;

// "none" disables expiry; 0, negative and oversized values are rejected.
fn parse_ttl(raw: Option<String>, key: &str, default: Option<i64>) -> Result<Option<i64>> {
  match raw.as_deref() {
    None => Ok(default),
    Some(v) if v.eq_ignore_ascii_case("none") => Ok(None),
    Some(v) => match v.parse::<i64>() {
      Ok(hours) if (1..=MAX_TOKEN_TTL_HOURS).contains(&hours) => Ok(Some(hours)),
      _ => Err(AppError::Config(format!("Invalid {} value: '{}'", key, v))),
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashMap;

  fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
  }

  #[test]
  fn memory_backend_needs_no_database_url() {
    let config = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory")])).unwrap();
    assert_eq!(config.store_backend, StoreBackend::Memory);
    assert_eq!(config.default_page_size, 15);
    assert_eq!(config.staff_token_ttl_hours, Some(48));
    assert_eq!(config.customer_token_ttl_hours, None);
  }

  #[test]
  fn postgres_backend_requires_database_url() {
    assert!(matches!(AppConfig::from_lookup(lookup(&[])), Err(AppError::Config(_))));
    let config = AppConfig::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
    assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/shop"));
  }

  #[test]
  fn invalid_values_are_configuration_errors() {
    let bad_port = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("SERVER_PORT", "eighty")]));
    assert!(matches!(bad_port, Err(AppError::Config(_))));

    let seed_without_password = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("SEED_DB", "true")]));
    assert!(matches!(seed_without_password, Err(AppError::Config(_))));

    let zero_ttl = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("STAFF_TOKEN_TTL_HOURS", "0")]));
    assert!(matches!(zero_ttl, Err(AppError::Config(_))));

    let huge_ttl = AppConfig::from_lookup(lookup(&[
      ("STORE_BACKEND", "memory"),
      ("STAFF_TOKEN_TTL_HOURS", "9000000000000"),
    ]));
    assert!(matches!(huge_ttl, Err(AppError::Config(_))));

    let ceiling = MAX_TOKEN_TTL_HOURS.to_string();
    let config = AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("CUSTOMER_TOKEN_TTL_HOURS", ceiling.as_str())]))
      .unwrap();
    assert_eq!(config.customer_token_ttl_hours, Some(MAX_TOKEN_TTL_HOURS));
  }

  #[test]
  fn ttl_can_be_disabled() {
    let config =
      AppConfig::from_lookup(lookup(&[("STORE_BACKEND", "memory"), ("STAFF_TOKEN_TTL_HOURS", "none")])).unwrap();
    assert_eq!(config.staff_token_ttl_hours, None);
  }
}
