// storefront/src/errors.rs

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use storefront_flow::FlowError;

/// Field name to human readable messages, rendered as the `errors` object of a 422 response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn single(field: &str, message: impl Into<String>) -> Self {
    let mut errors = Self::new();
    errors.add(field, message);
    errors
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_string()).or_default().push(message.into());
  }

  pub fn merge(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }

  /// Takes `other`'s messages only for fields that have none yet.
  pub fn merge_unreported(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_insert(messages);
    }
  }

  /// Records "field is required" for every blank entry.
  pub fn require_present(&mut self, fields: &[(&str, &str)]) {
    for (field, value) in fields {
      if value.trim().is_empty() {
        self.add(field, format!("The {} field is required.", field));
      }
    }
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn contains(&self, field: &str) -> bool {
    self.0.contains_key(field)
  }

  pub fn messages(&self, field: &str) -> &[String] {
    self.0.get(field).map(Vec::as_slice).unwrap_or_default()
  }

  /// `Ok(())` when nothing was recorded, otherwise a validation error carrying every field.
  pub fn into_result(self) -> Result<()> {
    if self.is_empty() {
      Ok(())
    } else {
      Err(AppError::Validation(self))
    }
  }
}

impl From<validator::ValidationErrors> for FieldErrors {
  fn from(errors: validator::ValidationErrors) -> Self {
    let mut fields = FieldErrors::new();
    for (field, field_errors) in errors.field_errors() {
      for error in field_errors {
        let message = error
          .message
          .as_ref()
          .map(|m| m.to_string())
          .unwrap_or_else(|| format!("The {} field is invalid ({}).", field, error.code));
        fields.add(&field, message);
      }
    }
    fields
  }
}

impl fmt::Display for FieldErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut first = true;
    for (field, messages) in &self.0 {
      for message in messages {
        if !first {
          f.write_str("; ")?;
        }
        write!(f, "{}: {}", field, message)?;
        first = false;
      }
    }
    Ok(())
  }
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(FieldErrors),

  #[error("Invalid credentials")]
  InvalidCredentials,

  #[error("Account is deactivated")]
  AccountDeactivated,

  #[error("Unauthenticated: {0}")]
  Unauthorized(String),

  #[error("Forbidden: {0}")]
  Forbidden(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Bad Request: {0}")]
  BadRequest(String),

  #[error("Storage Error: {0}")]
  Storage(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Migration Error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),

  #[error("Workflow Error: {source}")]
  Workflow { source: FlowError },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn validation(field: &str, message: impl Into<String>) -> Self {
    AppError::Validation(FieldErrors::single(field, message))
  }
}

impl From<FieldErrors> for AppError {
  fn from(errors: FieldErrors) -> Self {
    AppError::Validation(errors)
  }
}

// Handlers inside pipelines may hand back AppErrors wrapped by the engine; unwrap them so the
// caller sees the original variant.
impl From<FlowError> for AppError {
  fn from(err: FlowError) -> Self {
    match err {
      FlowError::HandlerError { source } => match source.downcast::<AppError>() {
        Ok(app_err) => app_err,
        Err(source) => AppError::Workflow {
          source: FlowError::HandlerError { source },
        },
      },
      other => AppError::Workflow { source: other },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::InvalidCredentials | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      AppError::AccountDeactivated | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
      AppError::Storage(_)
      | AppError::Config(_)
      | AppError::Sqlx(_)
      | AppError::Migration(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::debug!(application_error = %self, "Responding with error");
    }

    let body = match self {
      AppError::Validation(errors) => json!({
        "success": false,
        "message": "Validation errors",
        "errors": errors,
      }),
      AppError::InvalidCredentials => json!({"success": false, "message": "Invalid credentials"}),
      AppError::AccountDeactivated => json!({"success": false, "message": "Account is deactivated"}),
      AppError::Unauthorized(_) => json!({"success": false, "message": "Unauthenticated."}),
      AppError::Forbidden(m) | AppError::NotFound(m) | AppError::BadRequest(m) => {
        json!({"success": false, "message": m})
      }
      AppError::Storage(_) => json!({"success": false, "message": "File storage operation failed"}),
      AppError::Sqlx(_) | AppError::Migration(_) => {
        json!({"success": false, "message": "Database operation failed"})
      }
      AppError::Config(_) | AppError::Workflow { .. } | AppError::Internal(_) => {
        json!({"success": false, "message": "An internal error occurred"})
      }
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
