use chrono::NaiveDateTime;
use pushkind_common::pagination::Pagination;
use serde::{Deserialize, Serialize};

/// Domain representation of a product offered in the catalog.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Product {
    /// Unique identifier of the product.
    pub id: i32,
    /// Human-readable name of the product.
    pub name: String,
    /// Optional longer description shown to customers.
    pub description: Option<String>,
    /// Price represented in the smallest currency unit (for example cents).
    pub price_cents: i64,
    /// Units currently in stock.
    pub quantity: i32,
    /// Timestamp for when the product record was created.
    pub created_at: NaiveDateTime,
    /// Timestamp for the last update to the product record.
    pub updated_at: NaiveDateTime,
}

impl Product {
    /// Price formatted with two decimal places, e.g. `12.50`.
    pub fn price_formatted(&self) -> String {
        format_cents(self.price_cents)
    }
}

/// Payload required to insert a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i32,
    /// Timestamp captured when the product payload was created.
    pub updated_at: NaiveDateTime,
}

impl NewProduct {
    /// Build a new product payload with the supplied details and current timestamp.
    pub fn new(name: impl Into<String>, price_cents: i64, quantity: i32) -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            name: name.into(),
            description: None,
            price_cents,
            quantity,
            updated_at: now,
        }
    }

    /// Attach a descriptive text to the product payload.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Replacement data applied when an admin edits an existing product.
///
/// Edits go through the same validation as creation, so every field is
/// supplied; `None` for the description clears it.
#[derive(Debug, Clone)]
pub struct UpdateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i32,
    /// Timestamp captured when the patch was created.
    pub updated_at: NaiveDateTime,
}

impl UpdateProduct {
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        price_cents: i64,
        quantity: i32,
    ) -> Self {
        let now = chrono::Local::now().naive_utc();
        Self {
            name: name.into(),
            description,
            price_cents,
            quantity,
            updated_at: now,
        }
    }
}

/// Query definition used to list catalog products.
#[derive(Debug, Clone, Default)]
pub struct ProductListQuery {
    /// Optional name or description search term.
    pub search: Option<String>,
    /// Optional pagination options applied to the query.
    pub pagination: Option<Pagination>,
}

impl ProductListQuery {
    /// Construct a query that targets all products.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter the results by a search term applied to the name or description.
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

/// Render an amount in the smallest currency unit as a decimal string.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_cents_pads_fraction() {
        assert_eq!(format_cents(1250), "12.50");
        assert_eq!(format_cents(7), "0.07");
        assert_eq!(format_cents(-150), "-1.50");
        assert_eq!(format_cents(0), "0.00");
    }

    #[test]
    fn product_list_query_builder_sets_fields() {
        let query = ProductListQuery::new().search("mug").paginate(2, 20);

        assert_eq!(query.search.as_deref(), Some("mug"));
        let pagination = query.pagination.expect("pagination set");
        assert_eq!(pagination.page, 2);
        assert_eq!(pagination.per_page, 20);
    }
}
