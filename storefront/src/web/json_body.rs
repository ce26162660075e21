// storefront/src/web/json_body.rs

//! JSON body extractor that reports wrongly typed fields as validation errors.
//! Syntactically broken bodies still go through `json_config` and become 400s.

use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::ops::Deref;

use crate::errors::{AppError, FieldErrors};

#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> Deref for JsonBody<T> {
  type Target = T;

  fn deref(&self) -> &T {
    &self.0
  }
}

impl<T: DeserializeOwned + 'static> FromRequest for JsonBody<T> {
  type Error = actix_web::Error;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
    let body = web::Json::<Value>::from_request(req, payload);
    Box::pin(async move {
      let web::Json(value) = body.await?;
      Ok(JsonBody(decode_fields(value)?))
    })
  }
}

/// Decodes an object payload. When decoding fails, each field is retried on its own so
/// the error can name the offending keys. Payload types must be `#[serde(default)]`.
pub fn decode_fields<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
  let Value::Object(fields) = value else {
    return Err(AppError::BadRequest("The request body must be a JSON object.".to_string()));
  };
  let err = match serde_json::from_value::<T>(Value::Object(fields.clone())) {
    Ok(decoded) => return Ok(decoded),
    Err(err) => err,
  };

  let mut errors = FieldErrors::new();
  for (key, field) in &fields {
    let single: Map<String, Value> = [(key.clone(), field.clone())].into_iter().collect();
    if let Err(field_err) = serde_json::from_value::<T>(Value::Object(single)) {
      errors.add(key, type_message(key, &field_err));
    }
  }
  if errors.is_empty() {
    return Err(AppError::BadRequest(err.to_string()));
  }
  Err(AppError::Validation(errors))
}

fn type_message(field: &str, err: &serde_json::Error) -> String {
  let detail = err.to_string().to_lowercase();
  let expected = if detail.contains("expected a string") {
    "a string"
  } else if detail.contains("expected a boolean") {
    "true or false"
  } else if detail.contains("expected i") || detail.contains("expected u") {
    "an integer"
  } else if detail.contains("decimal") {
    "a number"
  } else {
    return format!("The {} field is invalid.", field);
  };
  format!("The {} field must be {}.", field, expected)
}
