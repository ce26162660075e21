// storefront/src/lib.rs

//! Storefront API: public catalog, customer and staff bearer-token sessions,
//! and admin management of products, customers and staff users.

pub mod config;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod store;
pub mod web;
