//! Small web shop: public catalog, session cart and checkout, plus an admin
//! area for products and orders.

pub mod domain;
pub mod forms;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schema;
pub mod services;

/// Role required for the `/admin` pages.
pub const SERVICE_ACCESS_ROLE: &str = "admin";
