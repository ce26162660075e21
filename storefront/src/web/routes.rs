// storefront/src/web/routes.rs

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::errors::AppError;
use crate::web::handlers::{
  admin_customer_handlers as admin_customers, admin_product_handlers as admin_products,
  admin_user_handlers as admin_users, customer_handlers, product_handlers, staff_handlers,
};

async fn health_check_handler() -> HttpResponse {
  HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Malformed JSON bodies become 400 responses in the standard error envelope.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Unparseable query strings are reported the same way as bad bodies.
pub fn query_config() -> web::QueryConfig {
  web::QueryConfig::default().error_handler(|err, _req| AppError::BadRequest(err.to_string()).into())
}

/// Malformed `{id}` segments can never match a row, so they read as a missing resource.
pub fn path_config() -> web::PathConfig {
  web::PathConfig::default().error_handler(|_err, req| AppError::NotFound(missing_resource(req.path()).to_string()).into())
}

fn missing_resource(path: &str) -> &'static str {
  if path.contains("/products") {
    "Product not found"
  } else if path.contains("/customers") {
    "Customer not found"
  } else if path.contains("/users") {
    "User not found"
  } else {
    "Resource not found"
  }
}

/// Mounts the whole API under `/api`.
pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api")
      .route("/health", web::get().to(health_check_handler))
      // Public catalog
      .service(
        web::scope("/products")
          .route("", web::get().to(product_handlers::list_products_handler))
          .route("/search", web::get().to(product_handlers::search_products_handler))
          .route("/{product_id}", web::get().to(product_handlers::get_product_handler)),
      )
      // Customer self-service
      .service(
        web::scope("/customer")
          .route("/register", web::post().to(customer_handlers::register_handler))
          .route("/login", web::post().to(customer_handlers::login_handler))
          .route("/logout", web::post().to(customer_handlers::logout_handler))
          .route("/profile", web::get().to(customer_handlers::profile_handler))
          .route("/profile", web::put().to(customer_handlers::update_profile_handler)),
      )
      // Staff session
      .route("/login", web::post().to(staff_handlers::login_handler))
      .route("/logout", web::post().to(staff_handlers::logout_handler))
      .route("/user", web::get().to(staff_handlers::current_principal_handler))
      // Admin
      .service(
        web::scope("/admin")
          .service(
            web::scope("/products")
              .route("", web::get().to(admin_products::list_handler))
              .route("", web::post().to(admin_products::create_handler))
              .route("/stats", web::get().to(admin_products::stats_handler))
              .route("/{id}", web::get().to(admin_products::get_handler))
              .route("/{id}", web::put().to(admin_products::update_handler))
              .route("/{id}", web::delete().to(admin_products::delete_handler))
              .route("/{id}/activate", web::patch().to(admin_products::activate_handler))
              .route("/{id}/deactivate", web::patch().to(admin_products::deactivate_handler)),
          )
          .service(
            web::scope("/customers")
              .route("", web::get().to(admin_customers::list_handler))
              .route("", web::post().to(admin_customers::create_handler))
              .route("/stats", web::get().to(admin_customers::stats_handler))
              .route("/{id}", web::get().to(admin_customers::get_handler))
              .route("/{id}", web::put().to(admin_customers::update_handler))
              .route("/{id}", web::delete().to(admin_customers::delete_handler))
              .route("/{id}/activate", web::patch().to(admin_customers::activate_handler))
              .route("/{id}/deactivate", web::patch().to(admin_customers::deactivate_handler)),
          )
          .service(
            web::scope("/users")
              .route("", web::get().to(admin_users::list_handler))
              .route("", web::post().to(admin_users::create_handler))
              .route("/{id}", web::get().to(admin_users::get_handler))
              .route("/{id}", web::put().to(admin_users::update_handler))
              .route("/{id}", web::delete().to(admin_users::delete_handler))
              .route("/{id}/activate", web::patch().to(admin_users::activate_handler))
              .route("/{id}/deactivate", web::patch().to(admin_users::deactivate_handler)),
          ),
      ),
  );
}
