pub use pushkind_common::services::errors::{ServiceError, ServiceResult};

pub mod cart;
pub mod orders;
pub mod products;
