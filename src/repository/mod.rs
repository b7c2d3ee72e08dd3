use pushkind_common::db::{DbConnection, DbPool};
use pushkind_common::repository::errors::RepositoryResult;

use crate::domain::order::{NewOrder, Order, OrderListQuery};
use crate::domain::product::{NewProduct, Product, ProductListQuery, UpdateProduct};

pub mod order;
pub mod product;

#[cfg(test)]
pub mod mock;

#[derive(Clone)]
/// Diesel-backed repository implementation that wraps an r2d2 pool.
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository using the provided connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations over catalog products.
pub trait ProductReader {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
    /// Fetch every product whose id is in `ids`; unknown ids are skipped.
    fn get_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>>;
    fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
}

/// Write operations over catalog products.
pub trait ProductWriter {
    fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
    /// Insert all products atomically, returning the number of inserted rows.
    fn create_products(&self, new_products: &[NewProduct]) -> RepositoryResult<usize>;
    fn update_product(&self, product_id: i32, updates: &UpdateProduct)
    -> RepositoryResult<Product>;
    fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
}

/// Read-only operations over placed orders.
pub trait OrderReader {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
}

/// Write operations over placed orders.
pub trait OrderWriter {
    /// Persist the order and its lines and take the ordered units out of stock.
    ///
    /// Runs in a single transaction. Products whose stock drops to zero are
    /// removed from the catalog.
    fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
}
