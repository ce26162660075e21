// storefront/src/main.rs

use std::sync::Arc;

use actix_web::{web as actix_data, App, HttpServer};
use anyhow::Context;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use storefront::config::{AppConfig, LogFormat, StoreBackend};
use storefront::services::image_store::LocalImageStore;
use storefront::services::seeder;
use storefront::state::AppState;
use storefront::store::{MemoryStore, PgStore, Repository};
use storefront::web;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE); // Log when spans close, showing duration
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Text => builder.init(),
  }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
  dotenvy::dotenv().ok();
  // The log format is itself configuration, so peek at it before the full load.
  let log_format = match std::env::var("LOG_FORMAT").ok().as_deref() {
    Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
    _ => LogFormat::Text,
  };
  init_tracing(log_format);
  tracing::info!("Starting storefront server...");

  let config = AppConfig::from_env().context("Failed to load application configuration")?;

  let store: Arc<dyn Repository> = match config.store_backend {
    StoreBackend::Postgres => {
      let pg = PgStore::connect(&config).await.context("Failed to connect to the database")?;
      if config.run_migrations {
        pg.migrate().await.context("Failed to run database migrations")?;
      }
      Arc::new(pg)
    }
    StoreBackend::Memory => {
      tracing::warn!("Using the in-memory store; data is lost on restart.");
      Arc::new(MemoryStore::new())
    }
  };

  if config.seed_db {
    if let Some(password) = config.seed_admin_password.as_deref() {
      seeder::seed_admin(store.as_ref(), &config.seed_admin_email, password)
        .await
        .context("Failed to seed the admin account")?;
    }
  }

  let images = Arc::new(LocalImageStore::new(config.image_root.clone()));
  tracing::info!(root = %images.root().display(), "Product images are served from the local disk.");
  let server_address = format!("{}:{}", config.server_host, config.server_port);
  let app_state = AppState::new(store, images, config).context("Failed to build application state")?;

  tracing::info!("Attempting to bind server to {}...", server_address);
  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .app_data(web::json_config())
      .app_data(web::query_config())
      .app_data(web::path_config())
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(web::configure_app_routes)
  })
  .bind(&server_address)
  .with_context(|| format!("Failed to bind {}", server_address))?
  .run()
  .await?;

  Ok(())
}
