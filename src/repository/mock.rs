use mockall::mock;

use super::{OrderReader, OrderWriter, ProductReader, ProductWriter};
use crate::domain::{
    order::{NewOrder, Order, OrderListQuery},
    product::{NewProduct, Product, ProductListQuery, UpdateProduct},
};
use pushkind_common::repository::errors::RepositoryResult;

mock! {
    pub ProductReader {}

    impl ProductReader for ProductReader {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>>;
        fn get_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>>;
        fn list_products(&self, query: ProductListQuery) -> RepositoryResult<(usize, Vec<Product>)>;
    }
}

mock! {
    pub ProductWriter {}

    impl ProductWriter for ProductWriter {
        fn create_product(&self, new_product: &NewProduct) -> RepositoryResult<Product>;
        fn create_products(&self, new_products: &[NewProduct]) -> RepositoryResult<usize>;
        fn update_product(&self, product_id: i32, updates: &UpdateProduct) -> RepositoryResult<Product>;
        fn delete_product(&self, product_id: i32) -> RepositoryResult<()>;
    }
}

mock! {
    pub OrderReader {}

    impl OrderReader for OrderReader {
        fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<Order>>;
        fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<Order>)>;
    }
}

mock! {
    pub OrderWriter {}

    impl OrderWriter for OrderWriter {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order>;
    }
}
