use std::collections::HashMap;

use diesel::prelude::*;
use pushkind_common::repository::errors::{RepositoryError, RepositoryResult};

use crate::{
    domain::order::{NewOrder as DomainNewOrder, Order as DomainOrder, OrderListQuery},
    models::order::{
        NewOrder as DbNewOrder, NewOrderLine as DbNewOrderLine, Order as DbOrder,
        OrderLine as DbOrderLine,
    },
    repository::{DieselRepository, OrderReader, OrderWriter, product::remove_product},
};

impl OrderReader for DieselRepository {
    fn get_order_by_id(&self, id: i32) -> RepositoryResult<Option<DomainOrder>> {
        use crate::schema::{order_lines, orders};

        let mut conn = self.conn()?;
        let order = orders::table
            .filter(orders::id.eq(id))
            .first::<DbOrder>(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let lines = order_lines::table
            .filter(order_lines::order_id.eq(order.id))
            .order(order_lines::id.asc())
            .load::<DbOrderLine>(&mut conn)?;

        Ok(Some(DomainOrder::from((order, lines))))
    }

    fn list_orders(&self, query: OrderListQuery) -> RepositoryResult<(usize, Vec<DomainOrder>)> {
        use crate::schema::{order_lines, orders};

        let mut conn = self.conn()?;

        let OrderListQuery { search, pagination } = query;
        let search_pattern = search.as_ref().map(|term| format!("%{}%", term));

        let mut count_query = orders::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(ref pattern) = search_pattern {
            count_query = count_query.filter(
                orders::name
                    .like(pattern.clone())
                    .or(orders::city.like(pattern.clone())),
            );
        }

        let total = count_query.count().get_result::<i64>(&mut conn)? as usize;

        let mut items = orders::table.into_boxed::<diesel::sqlite::Sqlite>();

        if let Some(ref pattern) = search_pattern {
            items = items.filter(
                orders::name
                    .like(pattern.clone())
                    .or(orders::city.like(pattern.clone())),
            );
        }

        items = items.order((orders::created_at.desc(), orders::id.desc()));

        if let Some(pagination) = pagination {
            let offset = ((pagination.page.max(1) - 1) * pagination.per_page) as i64;
            let limit = pagination.per_page as i64;
            items = items.offset(offset).limit(limit);
        }

        let db_orders = items.load::<DbOrder>(&mut conn)?;
        if db_orders.is_empty() {
            return Ok((total, Vec::new()));
        }

        let order_ids: Vec<i32> = db_orders.iter().map(|order| order.id).collect();

        let rows = order_lines::table
            .filter(order_lines::order_id.eq_any(&order_ids))
            .order(order_lines::id.asc())
            .load::<DbOrderLine>(&mut conn)?;

        let mut lines_by_order: HashMap<i32, Vec<DbOrderLine>> = HashMap::new();
        for line in rows {
            lines_by_order.entry(line.order_id).or_default().push(line);
        }

        let orders = db_orders
            .into_iter()
            .map(|order| {
                let lines = lines_by_order.remove(&order.id).unwrap_or_default();
                DomainOrder::from((order, lines))
            })
            .collect();

        Ok((total, orders))
    }
}

impl OrderWriter for DieselRepository {
    fn create_order(&self, new_order: &DomainNewOrder) -> RepositoryResult<DomainOrder> {
        use crate::schema::{order_lines, orders, products};

        let mut conn = self.conn()?;

        conn.transaction::<DomainOrder, RepositoryError, _>(|conn| {
            let total_cents = new_order.total_cents().ok_or_else(|| {
                diesel::result::Error::QueryBuilderError("order total does not fit in i64".into())
            })?;
            let db_new = DbNewOrder::from_domain(new_order, total_cents);

            let created = diesel::insert_into(orders::table)
                .values(&db_new)
                .get_result::<DbOrder>(conn)?;

            let order_id = created.id;

            if !new_order.lines.is_empty() {
                let payload: Vec<DbNewOrderLine> = new_order
                    .lines
                    .iter()
                    .map(|line| DbNewOrderLine::from_domain(order_id, line))
                    .collect();

                diesel::insert_into(order_lines::table)
                    .values(&payload)
                    .execute(conn)?;
            }

            for line in &new_order.lines {
                let Some(product_id) = line.product_id else {
                    continue;
                };

                let target = products::table
                    .filter(products::id.eq(product_id))
                    .filter(products::quantity.ge(line.quantity));

                let remaining = diesel::update(target)
                    .set(products::quantity.eq(products::quantity - line.quantity))
                    .returning(products::quantity)
                    .get_result::<i32>(conn)
                    .optional()?;

                match remaining {
                    // Unknown product or not enough stock left.
                    None => return Err(RepositoryError::NotFound),
                    Some(0) => {
                        remove_product(conn, product_id)?;
                    }
                    Some(_) => {}
                }
            }

            let lines = order_lines::table
                .filter(order_lines::order_id.eq(order_id))
                .order(order_lines::id.asc())
                .load::<DbOrderLine>(conn)?;

            Ok(DomainOrder::from((created, lines)))
        })
    }
}
