// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Product {
  pub id: Uuid,
  pub brand: String,
  pub name: String,
  /// Relative path on the public disk, always under `products/`.
  pub image: Option<String>,
  pub quantity: i32,
  pub cost_price: Decimal,
  pub sell_price: Decimal,
  pub description: Option<String>,
  pub rating: Option<i16>,
  pub active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A validated product ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
  pub brand: String,
  pub name: String,
  pub image: Option<String>,
  pub quantity: i32,
  pub cost_price: Decimal,
  pub sell_price: Decimal,
  pub description: Option<String>,
  pub rating: Option<i16>,
  pub active: bool,
}

/// Partial update. `None` leaves a field untouched; for nullable columns
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
  pub brand: Option<String>,
  pub name: Option<String>,
  pub image: Option<Option<String>>,
  pub quantity: Option<i32>,
  pub cost_price: Option<Decimal>,
  pub sell_price: Option<Decimal>,
  pub description: Option<Option<String>>,
  pub rating: Option<Option<i16>>,
  pub active: Option<bool>,
}

impl Product {
  pub fn from_new(id: Uuid, new: NewProduct, now: DateTime<Utc>) -> Self {
    Self {
      id,
      brand: new.brand,
      name: new.name,
      image: new.image,
      quantity: new.quantity,
      cost_price: new.cost_price,
      sell_price: new.sell_price,
      description: new.description,
      rating: new.rating,
      active: new.active,
      created_at: now,
      updated_at: now,
    }
  }
}

impl ProductChanges {
  pub fn is_empty(&self) -> bool {
    self.brand.is_none()
      && self.name.is_none()
      && self.image.is_none()
      && self.quantity.is_none()
      && self.cost_price.is_none()
      && self.sell_price.is_none()
      && self.description.is_none()
      && self.rating.is_none()
      && self.active.is_none()
  }

  /// Applies the present fields and returns the image path that was replaced, if any.
  pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> Option<String> {
    let mut replaced_image = None;
    if let Some(brand) = self.brand {
      product.brand = brand;
    }
    if let Some(name) = self.name {
      product.name = name;
    }
    if let Some(image) = self.image {
      if image != product.image {
        replaced_image = std::mem::replace(&mut product.image, image);
      }
    }
    if let Some(quantity) = self.quantity {
      product.quantity = quantity;
    }
    if let Some(cost_price) = self.cost_price {
      product.cost_price = cost_price;
    }
    if let Some(sell_price) = self.sell_price {
      product.sell_price = sell_price;
    }
    if let Some(description) = self.description {
      product.description = description;
    }
    if let Some(rating) = self.rating {
      product.rating = rating;
    }
    if let Some(active) = self.active {
      product.active = active;
    }
    product.updated_at = now;
    replaced_image
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
  }

  fn sample() -> Product {
    Product::from_new(
      Uuid::new_v4(),
      NewProduct {
        brand: "Acme".into(),
        name: "Anvil".into(),
        image: Some("products/anvil.png".into()),
        quantity: 3,
        cost_price: dec("50.00"),
        sell_price: dec("40.00"),
        description: None,
        rating: Some(4),
        active: true,
      },
      Utc::now(),
    )
  }

  #[test]
  fn apply_reports_replaced_image_only_when_it_changes() {
    let mut product = sample();
    let same = ProductChanges {
      image: Some(Some("products/anvil.png".into())),
      ..Default::default()
    };
    assert_eq!(same.apply(&mut product, Utc::now()), None);

    let replaced = ProductChanges {
      image: Some(Some("products/anvil-2.png".into())),
      rating: Some(None),
      ..Default::default()
    };
    assert_eq!(replaced.apply(&mut product, Utc::now()).as_deref(), Some("products/anvil.png"));
    assert_eq!(product.image.as_deref(), Some("products/anvil-2.png"));
    assert_eq!(product.rating, None);
  }

  #[test]
  fn prices_serialize_as_strings() {
    let json = serde_json::to_value(sample()).unwrap();
    assert_eq!(json["sell_price"], "40.00");
    assert_eq!(json["cost_price"], "50.00");
  }
}
