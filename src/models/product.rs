use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::product::{
    NewProduct as DomainNewProduct, Product as DomainProduct, UpdateProduct as DomainUpdateProduct,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::products)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i32,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::products)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: i64,
    pub quantity: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::products)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateProduct<'a> {
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price_cents: i64,
    pub quantity: i32,
    pub updated_at: NaiveDateTime,
}

impl From<Product> for DomainProduct {
    fn from(value: Product) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description,
            price_cents: value.price_cents,
            quantity: value.quantity,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainNewProduct> for NewProduct<'a> {
    fn from(value: &'a DomainNewProduct) -> Self {
        Self {
            name: value.name.as_str(),
            description: value.description.as_deref(),
            price_cents: value.price_cents,
            quantity: value.quantity,
            updated_at: value.updated_at,
        }
    }
}

impl<'a> From<&'a DomainUpdateProduct> for UpdateProduct<'a> {
    fn from(value: &'a DomainUpdateProduct) -> Self {
        Self {
            name: value.name.as_str(),
            description: value.description.as_deref(),
            price_cents: value.price_cents,
            quantity: value.quantity,
            updated_at: value.updated_at,
        }
    }
}
