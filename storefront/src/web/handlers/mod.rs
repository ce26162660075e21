// storefront/src/web/handlers/mod.rs

pub mod admin_customer_handlers;
pub mod admin_product_handlers;
pub mod admin_user_handlers;
pub mod customer_handlers;
pub mod product_handlers;
pub mod staff_handlers;

use serde::{Deserialize, Deserializer};
use validator::ValidateEmail;

use crate::errors::FieldErrors;

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de>,
{
  Option::<T>::deserialize(deserializer).map(Some)
}

/// Trimmed copy of a text field, with blank strings treated as absent.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
  value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// "sometimes|required|max" for an optional text field: when present it must be non-blank and short enough.
pub(crate) fn check_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
  let Some(value) = value else { return };
  if value.trim().is_empty() {
    errors.add(field, format!("The {} field is required.", field));
  } else if value.chars().count() > max {
    errors.add(field, format!("The {} field must not be greater than {} characters.", field, max));
  }
}

pub(crate) fn check_email(errors: &mut FieldErrors, value: Option<&str>) {
  let Some(value) = value else { return };
  if !value.validate_email() {
    errors.add("email", "The email field must be a valid email address.");
  } else if value.len() > 255 {
    errors.add("email", "The email field must not be greater than 255 characters.");
  }
}

pub(crate) fn check_password(errors: &mut FieldErrors, password: Option<&str>, confirmation: Option<Option<&str>>) {
  let Some(password) = password else { return };
  if password.chars().count() < 8 {
    errors.add("password", "The password field must be at least 8 characters.");
  }
  if let Some(confirmation) = confirmation {
    if confirmation != Some(password) {
      errors.add("password", "The password field confirmation does not match.");
    }
  }
}
