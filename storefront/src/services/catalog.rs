// storefront/src/services/catalog.rs

//! Catalog query contract: optional filters, newest-first ordering and
//! page envelopes shared by every listing endpoint.

use crate::errors::{FieldErrors, Result};
use crate::models::Product;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Raw listing parameters as they arrive on the query string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogQuery {
  pub brand: Option<String>,
  pub search: Option<String>,
  pub min_price: Option<String>,
  pub max_price: Option<String>,
  pub rating: Option<String>,
  pub active: Option<String>,
  pub page: Option<String>,
  pub per_page: Option<String>,
}

/// Page parameters on their own, for listings without product filters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<String>,
  pub per_page: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductFilter {
  pub brand: Option<String>,
  pub search: Option<String>,
  pub min_price: Option<Decimal>,
  pub max_price: Option<Decimal>,
  pub min_rating: Option<i16>,
  pub active: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
  pub page: u32,
  pub per_page: u32,
}

/// Paginated listing in the shape the storefront client reads.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
  pub current_page: u32,
  pub per_page: u32,
  pub total: u64,
  pub last_page: u32,
  pub from: Option<u64>,
  pub to: Option<u64>,
  pub data: Vec<T>,
}

// Blank strings count as absent.
fn present(raw: &Option<String>) -> Option<&str> {
  raw.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_price(raw: &Option<String>, field: &str, errors: &mut FieldErrors) -> Option<Decimal> {
  let value = present(raw)?;
  match value.parse::<Decimal>() {
    // Zero is "empty" and imposes no bound.
    Ok(price) if price.is_zero() => None,
    Ok(price) => Some(price),
    Err(_) => {
      errors.add(field, format!("The {} field must be a number.", field));
      None
    }
  }
}

impl ProductFilter {
  pub fn from_query(query: &CatalogQuery) -> std::result::Result<Self, FieldErrors> {
    let mut errors = FieldErrors::new();

    let min_price = parse_price(&query.min_price, "min_price", &mut errors);
    let max_price = parse_price(&query.max_price, "max_price", &mut errors);

    let min_rating = match present(&query.rating) {
      None => None,
      Some(value) => match value.parse::<i16>() {
        Ok(0) => None,
        Ok(rating) => Some(rating),
        Err(_) => {
          errors.add("rating", "The rating field must be an integer.");
          None
        }
      },
    };

    let active = match present(&query.active) {
      None => None,
      Some(value) => match parse_bool(value) {
        Some(flag) => Some(flag),
        None => {
          errors.add("active", "The active field must be true or false.");
          None
        }
      },
    };

    if !errors.is_empty() {
      return Err(errors);
    }

    Ok(Self {
      brand: present(&query.brand).map(str::to_string),
      search: present(&query.search).map(str::to_string),
      min_price,
      max_price,
      min_rating,
      active,
    })
  }

  /// Search-endpoint filter: active products matching `q` in name, brand or description.
  pub fn public_search(term: Option<&str>) -> Self {
    Self {
      search: term.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string),
      active: Some(true),
      ..Default::default()
    }
  }

  /// In-process evaluation of the filter; the SQL store compiles the same rules into a query.
  pub fn matches(&self, product: &Product) -> bool {
    if let Some(brand) = &self.brand {
      if !contains_ci(&product.brand, brand) {
        return false;
      }
    }
    if let Some(term) = &self.search {
      let in_description = product.description.as_deref().is_some_and(|d| contains_ci(d, term));
      if !(contains_ci(&product.name, term) || contains_ci(&product.brand, term) || in_description) {
        return false;
      }
    }
    if self.min_price.is_some_and(|min| product.sell_price < min) {
      return false;
    }
    if self.max_price.is_some_and(|max| product.sell_price > max) {
      return false;
    }
    if let Some(min_rating) = self.min_rating {
      match product.rating {
        Some(rating) if rating >= min_rating => {}
        _ => return false,
      }
    }
    if self.active.is_some_and(|active| product.active != active) {
      return false;
    }
    true
  }
}

pub fn parse_bool(value: &str) -> Option<bool> {
  match value.to_ascii_lowercase().as_str() {
    "true" | "1" => Some(true),
    "false" | "0" => Some(false),
    _ => None,
  }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
  haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Escapes `%`, `_` and `\` so user input matches literally inside a LIKE pattern.
pub fn like_pattern(term: &str) -> String {
  let mut pattern = String::with_capacity(term.len() + 2);
  pattern.push('%');
  for ch in term.chars() {
    if matches!(ch, '%' | '_' | '\\') {
      pattern.push('\\');
    }
    pattern.push(ch);
  }
  pattern.push('%');
  pattern
}

impl PageRequest {
  pub fn from_raw(
    page: &Option<String>,
    per_page: &Option<String>,
    default_per_page: u32,
    max_per_page: u32,
  ) -> std::result::Result<Self, FieldErrors> {
    let mut errors = FieldErrors::new();
    let mut positive = |raw: &Option<String>, field: &str, default: u32| match present(raw) {
      None => default,
      Some(value) => match value.parse::<u32>() {
        Ok(n) if n >= 1 => n,
        _ => {
          errors.add(field, format!("The {} field must be an integer of at least 1.", field));
          default
        }
      },
    };
    let page = positive(page, "page", 1);
    let per_page = positive(per_page, "per_page", default_per_page).min(max_per_page);
    if !errors.is_empty() {
      return Err(errors);
    }
    Ok(Self { page, per_page })
  }

  pub fn offset(&self) -> u64 {
    u64::from(self.page - 1) * u64::from(self.per_page)
  }
}

impl<T> Page<T> {
  pub fn new(data: Vec<T>, total: u64, request: PageRequest) -> Self {
    let per_page = u64::from(request.per_page);
    let last_page = total.div_ceil(per_page).max(1);
    let (from, to) = if data.is_empty() {
      (None, None)
    } else {
      let from = request.offset() + 1;
      (Some(from), Some(from + data.len() as u64 - 1))
    };
    Self {
      current_page: request.page,
      per_page: request.per_page,
      total,
      last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
      from,
      to,
      data,
    }
  }

  /// Slices an already ordered, fully materialised listing.
  pub fn from_vec(items: Vec<T>, request: PageRequest) -> Self {
    let total = items.len() as u64;
    let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
    let data: Vec<T> = items.into_iter().skip(offset).take(request.per_page as usize).collect();
    Self::new(data, total, request)
  }
}

/// Parses the catalog query into a filter and a page request, merging all field errors.
pub fn parse_catalog_query(
  query: &CatalogQuery,
  default_per_page: u32,
  max_per_page: u32,
) -> Result<(ProductFilter, PageRequest)> {
  let mut errors = FieldErrors::new();
  let filter = ProductFilter::from_query(query).map_err(|e| errors.merge(e)).ok();
  let page = PageRequest::from_raw(&query.page, &query.per_page, default_per_page, max_per_page)
    .map_err(|e| errors.merge(e))
    .ok();
  match (filter, page) {
    (Some(filter), Some(page)) => Ok((filter, page)),
    _ => Err(errors.into()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::NewProduct;
  use chrono::Utc;
  use uuid::Uuid;

  fn query(pairs: &[(&str, &str)]) -> CatalogQuery {
    let mut q = CatalogQuery::default();
    for (k, v) in pairs {
      let v = Some(v.to_string());
      match *k {
        "brand" => q.brand = v,
        "search" => q.search = v,
        "min_price" => q.min_price = v,
        "max_price" => q.max_price = v,
        "rating" => q.rating = v,
        "active" => q.active = v,
        "page" => q.page = v,
        "per_page" => q.per_page = v,
        other => panic!("unknown key {other}"),
      }
    }
    q
  }

  fn product(name: &str, brand: &str, price: &str, rating: Option<i16>, active: bool) -> Product {
    Product::from_new(
      Uuid::new_v4(),
      NewProduct {
        brand: brand.into(),
        name: name.into(),
        image: None,
        quantity: 1,
        cost_price: Decimal::ZERO,
        sell_price: price.parse().unwrap(),
        description: Some("Sturdy and reliable".into()),
        rating,
        active,
      },
      Utc::now(),
    )
  }

  #[test]
  fn blank_and_zero_parameters_impose_no_constraint() {
    let filter = ProductFilter::from_query(&query(&[
      ("brand", " "),
      ("min_price", "0"),
      ("max_price", ""),
      ("rating", "0"),
    ]))
    .unwrap();
    assert_eq!(filter, ProductFilter::default());
  }

  #[test]
  fn malformed_numbers_are_reported_per_field() {
    let err = ProductFilter::from_query(&query(&[("min_price", "ten"), ("rating", "4.5"), ("active", "maybe")]))
      .unwrap_err();
    assert!(err.contains("min_price"));
    assert!(err.contains("rating"));
    assert!(err.contains("active"));
    assert!(!err.contains("max_price"));
  }

  #[test]
  fn price_bounds_are_inclusive() {
    let filter = ProductFilter::from_query(&query(&[("min_price", "10"), ("max_price", "20")])).unwrap();
    assert!(filter.matches(&product("a", "b", "10.00", None, true)));
    assert!(filter.matches(&product("a", "b", "20", None, true)));
    assert!(!filter.matches(&product("a", "b", "20.01", None, true)));
    assert!(!filter.matches(&product("a", "b", "9.99", None, true)));
  }

  #[test]
  fn search_is_case_insensitive_across_name_brand_and_description() {
    let filter = ProductFilter::from_query(&query(&[("search", "STURDY")])).unwrap();
    assert!(filter.matches(&product("Hammer", "Acme", "1", None, true)));

    let filter = ProductFilter::from_query(&query(&[("search", "acm")])).unwrap();
    assert!(filter.matches(&product("Hammer", "Acme", "1", None, true)));

    let filter = ProductFilter::from_query(&query(&[("search", "saw")])).unwrap();
    assert!(!filter.matches(&product("Hammer", "Acme", "1", None, true)));
  }

  #[test]
  fn rating_threshold_excludes_unrated_products() {
    let filter = ProductFilter::from_query(&query(&[("rating", "4")])).unwrap();
    assert!(filter.matches(&product("a", "b", "1", Some(4), true)));
    assert!(filter.matches(&product("a", "b", "1", Some(5), true)));
    assert!(!filter.matches(&product("a", "b", "1", Some(3), true)));
    assert!(!filter.matches(&product("a", "b", "1", None, true)));
  }

  #[test]
  fn active_filter_applies_only_when_present() {
    let any = ProductFilter::default();
    assert!(any.matches(&product("a", "b", "1", None, false)));
    let active_only = ProductFilter::from_query(&query(&[("active", "1")])).unwrap();
    assert!(!active_only.matches(&product("a", "b", "1", None, false)));
  }

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }

  #[test]
  fn page_request_defaults_and_caps() {
    let page = PageRequest::from_raw(&None, &None, 15, 100).unwrap();
    assert_eq!(page, PageRequest { page: 1, per_page: 15 });

    let capped = PageRequest::from_raw(&Some("2".into()), &Some("500".into()), 15, 100).unwrap();
    assert_eq!(capped.per_page, 100);
    assert_eq!(capped.offset(), 100);

    assert!(PageRequest::from_raw(&Some("0".into()), &None, 15, 100).is_err());
  }

  #[test]
  fn page_envelope_reports_bounds() {
    let items: Vec<u32> = (1..=32).collect();
    let page = Page::from_vec(items, PageRequest { page: 3, per_page: 15 });
    assert_eq!(page.total, 32);
    assert_eq!(page.last_page, 3);
    assert_eq!(page.from, Some(31));
    assert_eq!(page.to, Some(32));
    assert_eq!(page.data, vec![31, 32]);

    let empty: Page<u32> = Page::from_vec(Vec::new(), PageRequest { page: 1, per_page: 15 });
    assert_eq!(empty.last_page, 1);
    assert_eq!(empty.from, None);
  }

  #[test]
  fn catalog_query_merges_filter_and_page_errors() {
    let err = parse_catalog_query(&query(&[("max_price", "x"), ("per_page", "-1")]), 15, 100).unwrap_err();
    match err {
      crate::errors::AppError::Validation(fields) => {
        assert!(fields.contains("max_price"));
        assert!(fields.contains("per_page"));
      }
      other => panic!("unexpected error: {other:?}"),
    }
  }
}
