// storefront/src/web/handlers/admin_user_handlers.rs

//! Staff account management. Updates replace the whole profile; the password
//! is optional there but must be confirmed whenever it is given.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use super::{check_email, check_password, check_text, non_blank};
use crate::errors::{AppError, FieldErrors};
use crate::models::{NewUser, Role, UserChanges};
use crate::services::auth_service;
use crate::services::catalog::{PageQuery, PageRequest};
use crate::state::AppState;
use crate::store::{UserStore, EMAIL_TAKEN};
use crate::web::extractors::AdminSession;
use crate::web::json_body::JsonBody;
use crate::web::responses;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPayload {
  pub fname: Option<String>,
  pub lname: Option<String>,
  pub email: Option<String>,
  pub contact: Option<String>,
  pub role: Option<String>,
  pub password: Option<String>,
  pub password_confirmation: Option<String>,
}

/// Fields shared by create and update once validated.
struct ValidUser {
  fname: String,
  lname: String,
  email: String,
  contact: String,
  role: Role,
  password: Option<String>,
}

fn is_valid_contact(contact: &str) -> bool {
  (10..=15).contains(&contact.len()) && contact.bytes().all(|b| b.is_ascii_digit())
}

impl UserPayload {
  fn validate(self, password_required: bool) -> Result<ValidUser, FieldErrors> {
    let mut errors = FieldErrors::new();
    for (field, value) in [("fname", &self.fname), ("lname", &self.lname)] {
      match value.as_deref() {
        None => errors.add(field, format!("The {} field is required.", field)),
        some => check_text(&mut errors, field, some, 255),
      }
    }

    match self.email.as_deref() {
      None => errors.add("email", "The email field is required."),
      some => check_email(&mut errors, some),
    }

    match self.contact.as_deref() {
      None => errors.add("contact", "The contact field is required."),
      Some(contact) if !is_valid_contact(contact) => errors.add("contact", "The contact field format is invalid."),
      Some(_) => {}
    }

    let role = match self.role.as_deref() {
      None => {
        errors.add("role", "The role field is required.");
        None
      }
      Some(raw) => {
        let role = raw.parse::<Role>().ok();
        if role.is_none() {
          errors.add("role", "The selected role is invalid.");
        }
        role
      }
    };

    let password = non_blank(self.password);
    if password_required && password.is_none() {
      errors.add("password", "The password field is required.");
    }
    check_password(&mut errors, password.as_deref(), Some(self.password_confirmation.as_deref()));

    match (self.fname, self.lname, self.email, self.contact, role) {
      (Some(fname), Some(lname), Some(email), Some(contact), Some(role)) if errors.is_empty() => Ok(ValidUser {
        fname: fname.trim().to_string(),
        lname: lname.trim().to_string(),
        email,
        contact,
        role,
        password,
      }),
      _ => Err(errors),
    }
  }
}

fn not_found() -> AppError {
  AppError::NotFound("User not found".to_string())
}

#[instrument(name = "handler::admin_list_users", skip(_admin, app_state))]
pub async fn list_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let config = &app_state.config;
  let page = PageRequest::from_raw(&query.page, &query.per_page, config.default_page_size, config.max_page_size)?;
  let users = app_state.store.list_users(page).await?;
  Ok(responses::ok("Users retrieved successfully", users))
}

#[instrument(name = "handler::admin_get_user", skip(_admin, app_state))]
pub async fn get_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user = app_state.store.find_user(path.into_inner()).await?.ok_or_else(not_found)?;
  Ok(responses::ok("User retrieved successfully", user))
}

#[instrument(name = "handler::admin_create_user", skip_all)]
pub async fn create_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  payload: JsonBody<UserPayload>,
) -> Result<HttpResponse, AppError> {
  let valid = payload.into_inner().validate(true)?;
  if app_state.store.user_email_taken(&valid.email, None).await? {
    return Err(AppError::validation("email", EMAIL_TAKEN));
  }
  let password = valid
    .password
    .ok_or_else(|| AppError::validation("password", "The password field is required."))?;

  let user = app_state
    .store
    .create_user(NewUser {
      fname: valid.fname,
      lname: valid.lname,
      email: valid.email,
      contact: valid.contact,
      password_hash: auth_service::hash_password(&password)?,
      role: valid.role,
    })
    .await?;
  info!(user_id = %user.id, role = %user.role, "Staff user created.");
  Ok(responses::created("User created successfully", user))
}

#[instrument(name = "handler::admin_update_user", skip(_admin, app_state, payload))]
pub async fn update_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: JsonBody<UserPayload>,
) -> Result<HttpResponse, AppError> {
  let user_id = path.into_inner();
  let valid = payload.into_inner().validate(false)?;
  if app_state.store.user_email_taken(&valid.email, Some(user_id)).await? {
    return Err(AppError::validation("email", EMAIL_TAKEN));
  }

  let changes = UserChanges {
    fname: valid.fname,
    lname: valid.lname,
    email: valid.email,
    contact: valid.contact,
    role: valid.role,
    password_hash: valid.password.as_deref().map(auth_service::hash_password).transpose()?,
  };
  let user = app_state.store.update_user(user_id, changes).await?.ok_or_else(not_found)?;
  Ok(responses::ok("User updated successfully", user))
}

#[instrument(name = "handler::admin_delete_user", skip(_admin, app_state))]
pub async fn delete_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  if !app_state.store.delete_user(path.into_inner()).await? {
    return Err(not_found());
  }
  Ok(responses::message("User deleted successfully"))
}

#[instrument(name = "handler::admin_activate_user", skip(_admin, app_state))]
pub async fn activate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user = app_state.store.set_user_status(path.into_inner(), true).await?.ok_or_else(not_found)?;
  Ok(responses::ok("User activated successfully", user))
}

#[instrument(name = "handler::admin_deactivate_user", skip(_admin, app_state))]
pub async fn deactivate_handler(
  _admin: AdminSession,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let user = app_state.store.set_user_status(path.into_inner(), false).await?.ok_or_else(not_found)?;
  Ok(responses::ok("User deactivated successfully", user))
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn payload(value: serde_json::Value) -> UserPayload {
    serde_json::from_value(value).unwrap()
  }

  #[test]
  fn contact_must_be_ten_to_fifteen_digits() {
    assert!(is_valid_contact("0123456789"));
    assert!(is_valid_contact("012345678901234"));
    assert!(!is_valid_contact("012345678"));
    assert!(!is_valid_contact("0123456789012345"));
    assert!(!is_valid_contact("+123456789012"));
  }

  #[test]
  fn create_requires_a_confirmed_password() {
    let base = json!({
        "fname": "Sam", "lname": "Staff", "email": "sam@example.com",
        "contact": "0123456789", "role": "admin"
    });
    let errors = payload(base.clone()).validate(true).err().unwrap();
    assert!(errors.contains("password"));

    let mut mismatched = base.clone();
    mismatched["password"] = json!("password123");
    mismatched["password_confirmation"] = json!("password124");
    assert!(payload(mismatched).validate(true).err().unwrap().contains("password"));

    let mut good = base;
    good["password"] = json!("password123");
    good["password_confirmation"] = json!("password123");
    let valid = payload(good).validate(true).ok().unwrap();
    assert_eq!(valid.role, Role::Admin);
  }

  #[test]
  fn update_may_omit_password_but_not_profile_fields() {
    let valid = payload(json!({
        "fname": "Sam", "lname": "Staff", "email": "sam@example.com",
        "contact": "0123456789", "role": "user"
    }))
    .validate(false)
    .ok()
    .unwrap();
    assert!(valid.password.is_none());

    let errors = payload(json!({ "fname": "Sam", "role": "owner" })).validate(false).err().unwrap();
    for field in ["lname", "email", "contact", "role"] {
      assert!(errors.contains(field), "expected an error for {field}");
    }
  }
}
