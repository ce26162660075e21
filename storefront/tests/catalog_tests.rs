// storefront/tests/catalog_tests.rs

#[macro_use]
mod common;

use actix_web::http::StatusCode;
use actix_web::test::TestRequest;
use serde_json::{json, Value};

use common::{admin_login_request, bearer, insert_product, product, send, setup, token_of};

fn names(body: &Value) -> Vec<String> {
  let items = body["data"]["data"].as_array().or_else(|| body["data"].as_array()).expect("product list");
  items.iter().map(|p| p["name"].as_str().unwrap_or_default().to_string()).collect()
}

#[actix_web::test]
async fn public_listing_only_shows_active_products() {
  let ctx = setup().await;
  insert_product(&ctx, product("Acme", "Visible", "10.00", Some(4), true)).await;
  insert_product(&ctx, product("Acme", "Hidden", "12.00", Some(4), false)).await;
  let app = test_app!(ctx);

  // `active=false` is ignored on the public route.
  let req = TestRequest::get().uri("/api/products?active=false").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), vec!["Visible"]);
  assert_eq!(body["data"]["total"], 1);
  assert_eq!(body["data"]["current_page"], 1);
}

#[actix_web::test]
async fn listing_filters_by_price_rating_brand_and_search() {
  let ctx = setup().await;
  insert_product(&ctx, product("Acme", "Cheap Kettle", "5.00", Some(2), true)).await;
  insert_product(&ctx, product("Acme", "Mid Kettle", "50.00", Some(4), true)).await;
  insert_product(&ctx, product("Globex", "Fancy Toaster", "150.00", Some(5), true)).await;
  let app = test_app!(ctx);

  let req = TestRequest::get().uri("/api/products?min_price=10&max_price=100").to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(names(&body), vec!["Mid Kettle"]);

  let req = TestRequest::get().uri("/api/products?rating=4").to_request();
  let (_, body) = send(&app, req).await;
  let mut found = names(&body);
  found.sort();
  assert_eq!(found, vec!["Fancy Toaster", "Mid Kettle"]);

  let req = TestRequest::get().uri("/api/products?brand=globex").to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(names(&body), vec!["Fancy Toaster"]);

  let req = TestRequest::get().uri("/api/products?search=kettle").to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["data"]["total"], 2);

  // Zero and blank mean "no constraint".
  let req = TestRequest::get().uri("/api/products?min_price=0&max_price=&rating=0").to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["data"]["total"], 3);
}

#[actix_web::test]
async fn listing_paginates_newest_first() {
  let ctx = setup().await;
  for i in 0..5 {
    insert_product(&ctx, product("Acme", &format!("Item {}", i), "1.00", None, true)).await;
  }
  let app = test_app!(ctx);

  let req = TestRequest::get().uri("/api/products?per_page=2&page=2").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["per_page"], 2);
  assert_eq!(body["data"]["last_page"], 3);
  assert_eq!(body["data"]["from"], 3);
  assert_eq!(body["data"]["to"], 4);
  assert_eq!(names(&body), vec!["Item 2", "Item 1"]);
}

#[actix_web::test]
async fn malformed_filters_are_rejected() {
  let ctx = setup().await;
  let app = test_app!(ctx);

  let req = TestRequest::get().uri("/api/products?min_price=cheap&page=0").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["success"], false);
  assert!(body["errors"]["min_price"].is_array());
  assert!(body["errors"]["page"].is_array());
}

#[actix_web::test]
async fn search_matches_name_brand_and_description() {
  let ctx = setup().await;
  insert_product(&ctx, product("Initech", "Stapler", "8.00", None, true)).await;
  insert_product(&ctx, product("Initech", "Old Stapler", "8.00", None, false)).await;
  insert_product(&ctx, product("Acme", "Anvil", "80.00", None, true)).await;
  let app = test_app!(ctx);

  let req = TestRequest::get().uri("/api/products/search?q=staple").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(names(&body), vec!["Stapler"]);

  // Description is "<name> by <brand>".
  let req = TestRequest::get().uri("/api/products/search?q=by%20acme").to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(names(&body), vec!["Anvil"]);

  // Wildcards are literal.
  let req = TestRequest::get().uri("/api/products/search?q=%25").to_request();
  let (_, body) = send(&app, req).await;
  assert!(names(&body).is_empty());
}

#[actix_web::test]
async fn inactive_or_unknown_products_are_not_found() {
  let ctx = setup().await;
  let hidden = insert_product(&ctx, product("Acme", "Hidden", "12.00", None, false)).await;
  let app = test_app!(ctx);

  let req = TestRequest::get().uri(&format!("/api/products/{}", hidden.id)).to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Product not found");

  let req = TestRequest::get().uri(&format!("/api/products/{}", uuid::Uuid::new_v4())).to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_product_lifecycle() {
  let ctx = setup().await;
  let image_path = ctx.image_root.path().join("products/kettle.png");
  std::fs::create_dir_all(image_path.parent().expect("parent")).expect("mkdir");
  std::fs::write(&image_path, b"png").expect("write image");
  let app = test_app!(ctx);

  let (_, login) = send(&app, admin_login_request().to_request()).await;
  let auth = bearer(&token_of(&login));

  // Selling below cost is allowed.
  let req = TestRequest::post()
    .uri("/api/admin/products")
    .insert_header(auth.clone())
    .set_json(json!({
        "brand": "Acme",
        "name": "Kettle",
        "image": "products/kettle.png",
        "quantity": 3,
        "cost_price": "50.00",
        "sell_price": "40.00",
        "rating": 3,
    }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["data"]["sell_price"], "40.00");
  assert_eq!(body["data"]["active"], true);
  let id = body["data"]["id"].as_str().expect("id").to_string();

  let req = TestRequest::put()
    .uri(&format!("/api/admin/products/{}", id))
    .insert_header(auth.clone())
    .set_json(json!({ "description": "Boils water", "rating": null }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["description"], "Boils water");
  assert!(body["data"]["rating"].is_null());
  assert_eq!(body["data"]["name"], "Kettle");

  let req = TestRequest::patch()
    .uri(&format!("/api/admin/products/{}/deactivate", id))
    .insert_header(auth.clone())
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["active"], false);

  let req = TestRequest::get().uri("/api/admin/products/stats").insert_header(auth.clone()).to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["data"]["total"], 1);
  assert_eq!(body["data"]["active"], 0);

  let req = TestRequest::get()
    .uri("/api/admin/products?active=false")
    .insert_header(auth.clone())
    .to_request();
  let (_, body) = send(&app, req).await;
  assert_eq!(body["data"]["total"], 1);

  let req = TestRequest::delete()
    .uri(&format!("/api/admin/products/{}", id))
    .insert_header(auth.clone())
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert!(!image_path.exists());

  let req = TestRequest::get()
    .uri(&format!("/api/admin/products/{}", id))
    .insert_header(auth)
    .to_request();
  let (status, _) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn admin_product_validation_reports_every_field() {
  let ctx = setup().await;
  let app = test_app!(ctx);
  let (_, login) = send(&app, admin_login_request().to_request()).await;

  let req = TestRequest::post()
    .uri("/api/admin/products")
    .insert_header(bearer(&token_of(&login)))
    .set_json(json!({ "brand": "", "quantity": -1, "sell_price": "-2", "rating": 9, "image": "../etc/passwd" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  for field in ["brand", "name", "quantity", "cost_price", "sell_price", "rating", "image"] {
    assert!(body["errors"][field].is_array(), "missing error for {}", field);
  }
}

#[actix_web::test]
async fn malformed_ids_use_the_error_envelope() {
  let ctx = setup().await;
  let app = test_app!(ctx);

  let req = TestRequest::get().uri("/api/products/abc").to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["success"], false);
  assert_eq!(body["message"], "Product not found");

  let (_, login) = send(&app, admin_login_request().to_request()).await;
  let auth = bearer(&token_of(&login));
  let req = TestRequest::delete()
    .uri("/api/admin/products/abc")
    .insert_header(auth.clone())
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "Product not found");

  let req = TestRequest::get().uri("/api/admin/users/123").insert_header(auth).to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert_eq!(body["message"], "User not found");
}

#[actix_web::test]
async fn wrongly_typed_product_fields_are_validation_errors() {
  let ctx = setup().await;
  let existing = insert_product(&ctx, product("Acme", "Kettle", "10.00", None, true)).await;
  let app = test_app!(ctx);
  let (_, login) = send(&app, admin_login_request().to_request()).await;
  let auth = bearer(&token_of(&login));

  let req = TestRequest::post()
    .uri("/api/admin/products")
    .insert_header(auth.clone())
    .set_json(json!({ "brand": "Acme", "name": 5, "quantity": "abc", "cost_price": "1", "sell_price": "2" }))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
  assert_eq!(body["errors"]["name"][0], "The name field must be a string.");
  assert_eq!(body["errors"]["quantity"][0], "The quantity field must be an integer.");
  assert!(body["errors"].get("brand").is_none());

  // An empty update changes nothing and still returns the product.
  let req = TestRequest::put()
    .uri(&format!("/api/admin/products/{}", existing.id))
    .insert_header(auth)
    .set_json(json!({}))
    .to_request();
  let (status, body) = send(&app, req).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["data"]["name"], "Kettle");
}
