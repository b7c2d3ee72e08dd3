use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

use crate::domain::product::format_cents;

/// Snapshot of a product captured when an order is placed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderLine {
    /// Catalog product the line was created from; `None` once that product is deleted.
    pub product_id: Option<i32>,
    /// Product name at checkout time.
    pub name: String,
    /// Unit price at checkout time, in the smallest currency unit.
    pub price_cents: i64,
    /// Number of units ordered.
    pub quantity: i32,
}

impl OrderLine {
    /// Line total in the smallest currency unit, `None` when it does not fit in an `i64`.
    pub fn total_cents(&self) -> Option<i64> {
        self.price_cents.checked_mul(i64::from(self.quantity))
    }
}

/// Domain representation of a placed order.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i32,
    /// Name of the customer the order ships to.
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    /// Order total in the smallest currency unit.
    pub total_cents: i64,
    /// Lines captured at checkout.
    pub lines: Vec<OrderLine>,
    /// Timestamp for when the order was placed.
    pub created_at: NaiveDateTime,
}

impl Order {
    pub fn total_formatted(&self) -> String {
        format_cents(self.total_cents)
    }
}

/// Payload required to insert a new order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    /// Lines to persist; each line decrements the stock of its product.
    pub lines: Vec<OrderLine>,
}

impl NewOrder {
    /// Sum of all line totals, `None` when it does not fit in an `i64`.
    pub fn total_cents(&self) -> Option<i64> {
        self.lines
            .iter()
            .try_fold(0i64, |total, line| total.checked_add(line.total_cents()?))
    }
}

/// Query definition used to list orders in the admin area.
#[derive(Debug, Clone, Default)]
pub struct OrderListQuery {
    /// Optional customer name or city search term.
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl OrderListQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter orders by customer name or city.
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Apply pagination to the query with the given page number and page size.
    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}
