// storefront/tests/common/mod.rs
#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::test;
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;

use storefront::config::{AppConfig, StoreBackend};
use storefront::models::{NewProduct, Product};
use storefront::services::image_store::LocalImageStore;
use storefront::services::seeder;
use storefront::state::AppState;
use storefront::store::{MemoryStore, ProductStore};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

/// Application state over a fresh in-memory store and a temporary image root.
pub struct TestContext {
  pub state: AppState,
  pub image_root: TempDir,
}

pub async fn setup() -> TestContext {
  setup_tracing();
  let image_root = tempfile::tempdir().expect("tempdir");
  let config = AppConfig {
    store_backend: StoreBackend::Memory,
    image_root: image_root.path().to_path_buf(),
    ..AppConfig::default()
  };
  let store = Arc::new(MemoryStore::new());
  seeder::seed_admin(store.as_ref(), ADMIN_EMAIL, ADMIN_PASSWORD)
    .await
    .expect("seed admin");
  let images = Arc::new(LocalImageStore::new(image_root.path()));
  let state = AppState::new(store, images, config).expect("app state");
  TestContext { state, image_root }
}

/// Builds the full actix service for a `TestContext`.
macro_rules! test_app {
  ($ctx:expr) => {
    actix_web::test::init_service(
      actix_web::App::new()
        .app_data(actix_web::web::Data::new($ctx.state.clone()))
        .app_data(storefront::web::json_config())
        .app_data(storefront::web::query_config())
        .app_data(storefront::web::path_config())
        .configure(storefront::web::configure_app_routes),
    )
    .await
  };
}

/// Sends a request and decodes the JSON body (`Null` when empty).
pub async fn send<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
  S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
  B: MessageBody,
{
  let resp = test::call_service(app, req).await;
  let status = resp.status();
  let body = test::read_body(resp).await;
  let json = if body.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&body).expect("json body")
  };
  (status, json)
}

pub fn bearer(token: &str) -> (&'static str, String) {
  ("Authorization", format!("Bearer {}", token))
}

pub fn product(brand: &str, name: &str, price: &str, rating: Option<i16>, active: bool) -> NewProduct {
  NewProduct {
    brand: brand.to_string(),
    name: name.to_string(),
    image: None,
    quantity: 5,
    cost_price: Decimal::ONE,
    sell_price: price.parse().expect("price"),
    description: Some(format!("{} by {}", name, brand)),
    rating,
    active,
  }
}

pub async fn insert_product(ctx: &TestContext, new_product: NewProduct) -> Product {
  ctx.state.store.create_product(new_product).await.expect("insert product")
}

pub fn registration(email: &str) -> Value {
  serde_json::json!({
      "fname": "Casey",
      "lname": "Customer",
      "email": email,
      "contact": "5551234",
      "password": "password123",
      "password_confirmation": "password123",
  })
}

pub fn login_request(path: &str, email: &str, password: &str) -> test::TestRequest {
  test::TestRequest::post()
    .uri(path)
    .set_json(serde_json::json!({ "email": email, "password": password }))
}

pub fn admin_login_request() -> test::TestRequest {
  login_request("/api/login", ADMIN_EMAIL, ADMIN_PASSWORD)
}

/// Pulls the plain-text bearer token out of a login or registration response.
pub fn token_of(body: &Value) -> String {
  body["data"]["token"].as_str().expect("token in response").to_string()
}
