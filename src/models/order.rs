use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::order::{
    NewOrder as DomainNewOrder, Order as DomainOrder, OrderLine as DomainOrderLine,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::orders)]
pub struct Order {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub total_cents: i64,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable, Associations)]
#[diesel(table_name = crate::schema::order_lines)]
#[diesel(belongs_to(Order, foreign_key = order_id))]
pub struct OrderLine {
    pub id: i32,
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::orders)]
pub struct NewOrder<'a> {
    pub name: &'a str,
    pub address: &'a str,
    pub city: &'a str,
    pub zip: &'a str,
    pub country: &'a str,
    pub total_cents: i64,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::order_lines)]
pub struct NewOrderLine<'a> {
    pub order_id: i32,
    pub product_id: Option<i32>,
    pub name: &'a str,
    pub price_cents: i64,
    pub quantity: i32,
}

impl Order {
    pub fn into_domain(self, lines: Vec<OrderLine>) -> DomainOrder {
        DomainOrder {
            id: self.id,
            name: self.name,
            address: self.address,
            city: self.city,
            zip: self.zip,
            country: self.country,
            total_cents: self.total_cents,
            lines: lines.into_iter().map(OrderLine::into_domain).collect(),
            created_at: self.created_at,
        }
    }
}

impl OrderLine {
    pub fn into_domain(self) -> DomainOrderLine {
        DomainOrderLine {
            product_id: self.product_id,
            name: self.name,
            price_cents: self.price_cents,
            quantity: self.quantity,
        }
    }
}

impl From<(Order, Vec<OrderLine>)> for DomainOrder {
    fn from(value: (Order, Vec<OrderLine>)) -> Self {
        value.0.into_domain(value.1)
    }
}

impl<'a> NewOrder<'a> {
    pub fn from_domain(value: &'a DomainNewOrder, total_cents: i64) -> Self {
        Self {
            name: value.name.as_str(),
            address: value.address.as_str(),
            city: value.city.as_str(),
            zip: value.zip.as_str(),
            country: value.country.as_str(),
            total_cents,
        }
    }
}

impl<'a> NewOrderLine<'a> {
    pub fn from_domain(order_id: i32, value: &'a DomainOrderLine) -> Self {
        Self {
            order_id,
            product_id: value.product_id,
            name: value.name.as_str(),
            price_cents: value.price_cents,
            quantity: value.quantity,
        }
    }
}
