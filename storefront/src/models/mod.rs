// storefront/src/models/mod.rs

//! Contains data structures representing database entities.

pub mod customer;
pub mod principal;
pub mod product;
pub mod token;
pub mod user;

pub use customer::{Customer, CustomerChanges, NewCustomer};
pub use principal::{Capability, Principal, Session};
pub use product::{NewProduct, Product, ProductChanges};
pub use token::{AccessToken, AccountKind, AccountRef, IssuedToken, PendingToken};
pub use user::{NewUser, Role, User, UserChanges};
