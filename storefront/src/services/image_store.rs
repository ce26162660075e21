// storefront/src/services/image_store.rs

use crate::errors::AppError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument, warn};

/// Prefix every stored product image lives under.
pub const PRODUCT_IMAGE_PREFIX: &str = "products/";

/// Public-disk storage for product images.
#[async_trait]
pub trait ImageStore: Send + Sync {
  /// Removes the file behind `reference`. A file that is already gone is not an error.
  async fn delete(&self, reference: &str) -> Result<(), AppError>;
}

pub struct LocalImageStore {
  root: PathBuf,
}

impl LocalImageStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

/// Checks that an image reference is a relative path under `products/` with no parent hops.
pub fn validate_reference(reference: &str) -> Result<(), String> {
  if !reference.starts_with(PRODUCT_IMAGE_PREFIX) || reference.len() == PRODUCT_IMAGE_PREFIX.len() {
    return Err(format!("The image must be a path under {}.", PRODUCT_IMAGE_PREFIX));
  }
  if reference.contains('\\') || reference.len() > 255 {
    return Err("The image path is invalid.".to_string());
  }
  let escapes = Path::new(reference)
    .components()
    .any(|c| !matches!(c, Component::Normal(_)));
  if escapes {
    return Err("The image path is invalid.".to_string());
  }
  Ok(())
}

#[async_trait]
impl ImageStore for LocalImageStore {
  #[instrument(name = "image_store::delete", skip(self))]
  async fn delete(&self, reference: &str) -> Result<(), AppError> {
    validate_reference(reference).map_err(AppError::Storage)?;
    match tokio::fs::remove_file(self.root.join(reference)).await {
      Ok(()) => {
        debug!("Image removed.");
        Ok(())
      }
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
      Err(e) => Err(AppError::Storage(format!("Failed to delete image '{}': {}", reference, e))),
    }
  }
}

/// Best-effort removal: failures are logged and never reach the caller.
pub async fn discard(images: &dyn ImageStore, reference: &str) {
  if let Err(e) = images.delete(reference).await {
    warn!(image = %reference, error = %e, "Could not delete product image.");
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn references_must_stay_under_products() {
    assert!(validate_reference("products/a.png").is_ok());
    assert!(validate_reference("products/2024/a.png").is_ok());
    assert!(validate_reference("products/").is_err());
    assert!(validate_reference("avatars/a.png").is_err());
    assert!(validate_reference("products/../.env").is_err());
    assert!(validate_reference("/products/a.png").is_err());
    assert!(validate_reference("products\\a.png").is_err());
  }

  #[tokio::test]
  async fn delete_removes_file_and_tolerates_missing_ones() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("products")).unwrap();
    std::fs::write(dir.path().join("products/a.png"), b"png").unwrap();

    let store = LocalImageStore::new(dir.path());
    store.delete("products/a.png").await.unwrap();
    assert!(!dir.path().join("products/a.png").exists());
    store.delete("products/a.png").await.unwrap();
  }

  #[tokio::test]
  async fn discard_swallows_errors() {
    let store = LocalImageStore::new("/nonexistent-root");
    discard(&store, "../escape.png").await;
  }
}
