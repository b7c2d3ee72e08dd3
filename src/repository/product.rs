use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::product::{
        NewProduct as DomainNewProduct, Product as DomainProduct, ProductListQuery,
        UpdateProduct as DomainUpdateProduct,
    },
    models::product::{
        NewProduct as DbNewProduct, Product as DbProduct, UpdateProduct as DbUpdateProduct,
    },
    repository::{DieselRepository, ProductReader, ProductWriter},
};

impl ProductReader for DieselRepository {
    fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<DomainProduct>> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let product = products::table
            .filter(products::id.eq(id))
            .first::<DbProduct>(&mut conn)
            .optional()?;

        Ok(product.map(Into::into))
    }

    fn get_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<DomainProduct>> {
        use crate::schema::products;

        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.conn()?;
        let rows = products::table
            .filter(products::id.eq_any(ids))
            .load::<DbProduct>(&mut conn)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    fn list_products(
        &self,
        query: ProductListQuery,
    ) -> RepositoryResult<(usize, Vec<DomainProduct>)> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let search_pattern = query.search.as_ref().map(|term| format!("%{}%", term));

        let mut count_query = products::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(ref pattern) = search_pattern {
            count_query = count_query.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::description.like(pattern.clone())),
            );
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = products::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(ref pattern) = search_pattern {
            items = items.filter(
                products::name
                    .like(pattern.clone())
                    .or(products::description.like(pattern.clone())),
            );
        }

        items = items.order((products::created_at.desc(), products::id.desc()));

        if let Some(pagination) = &query.pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_products = items.load::<DbProduct>(&mut conn)?;

        Ok((total, db_products.into_iter().map(Into::into).collect()))
    }
}

impl ProductWriter for DieselRepository {
    fn create_product(&self, new_product: &DomainNewProduct) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_new = DbNewProduct::from(new_product);

        let created = diesel::insert_into(products::table)
            .values(&db_new)
            .get_result::<DbProduct>(&mut conn)?;

        Ok(created.into())
    }

    fn create_products(&self, new_products: &[DomainNewProduct]) -> RepositoryResult<usize> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let payload: Vec<DbNewProduct> = new_products.iter().map(DbNewProduct::from).collect();

        conn.transaction::<usize, RepositoryError, _>(|conn| {
            let inserted = diesel::insert_into(products::table)
                .values(&payload)
                .execute(conn)?;
            Ok(inserted)
        })
    }

    fn update_product(
        &self,
        product_id: i32,
        updates: &DomainUpdateProduct,
    ) -> RepositoryResult<DomainProduct> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let db_updates = DbUpdateProduct::from(updates);

        let updated = diesel::update(products::table.filter(products::id.eq(product_id)))
            .set(&db_updates)
            .get_result::<DbProduct>(&mut conn)
            .optional()?
            .ok_or(RepositoryError::NotFound)?;

        Ok(updated.into())
    }

    fn delete_product(&self, product_id: i32) -> RepositoryResult<()> {
        let mut conn = self.conn()?;

        conn.transaction::<(), RepositoryError, _>(|conn| {
            if remove_product(conn, product_id)? == 0 {
                return Err(RepositoryError::NotFound);
            }
            Ok(())
        })
    }
}

/// Delete a product, detaching it from the order lines that reference it.
///
/// Returns the number of deleted product rows.
pub(crate) fn remove_product(
    conn: &mut SqliteConnection,
    product_id: i32,
) -> QueryResult<usize> {
    use crate::schema::{order_lines, products};

    diesel::update(order_lines::table.filter(order_lines::product_id.eq(product_id)))
        .set(order_lines::product_id.eq(None::<i32>))
        .execute(conn)?;

    diesel::delete(products::table.filter(products::id.eq(product_id))).execute(conn)
}
