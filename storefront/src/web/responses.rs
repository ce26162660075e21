// storefront/src/web/responses.rs

//! The `{success, message, data}` envelope every successful response uses.

use actix_web::{http::StatusCode, HttpResponse};
use serde::Serialize;
use serde_json::json;

pub fn with_data<T: Serialize>(status: StatusCode, message: &str, data: T) -> HttpResponse {
  HttpResponse::build(status).json(json!({
      "success": true,
      "message": message,
      "data": data,
  }))
}

pub fn ok<T: Serialize>(message: &str, data: T) -> HttpResponse {
  with_data(StatusCode::OK, message, data)
}

pub fn created<T: Serialize>(message: &str, data: T) -> HttpResponse {
  with_data(StatusCode::CREATED, message, data)
}

/// Success without a payload, e.g. after a delete or logout.
pub fn message(message: &str) -> HttpResponse {
  HttpResponse::Ok().json(json!({
      "success": true,
      "message": message,
  }))
}
