use std::collections::HashMap;

use serde::Serialize;

use crate::domain::cart::Cart;
use crate::domain::product::{Product, format_cents};
use crate::repository::ProductReader;
use crate::services::{ServiceError, ServiceResult};

/// A cart line joined with the current catalog data.
#[derive(Debug, Serialize)]
pub struct CartLineView {
    pub product_id: i32,
    pub name: String,
    pub price_cents: i64,
    pub price_formatted: String,
    pub quantity: i32,
    pub line_total_cents: i64,
    pub line_total_formatted: String,
}

/// Cart contents and valuation shown on the cart page.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total_quantity: i64,
    pub total_cents: i64,
    pub total_formatted: String,
    /// Average price per unit in the cart; zero for an empty cart.
    pub average_cents: i64,
    pub average_formatted: String,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Resolve the cart against the catalog and compute its totals.
///
/// Lines referring to products that no longer exist are left out. A total that
/// does not fit in an `i64` is reported as a form error.
pub fn load_cart<R>(repo: &R, cart: &Cart) -> ServiceResult<CartView>
where
    R: ProductReader + ?Sized,
{
    let products = fetch_cart_products(repo, cart)?;

    let mut lines = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let Some(product) = products.get(&line.product_id) else {
            continue;
        };
        let line_total_cents = product
            .price_cents
            .checked_mul(i64::from(line.quantity))
            .ok_or_else(total_too_large)?;
        lines.push(CartLineView {
            product_id: product.id,
            name: product.name.clone(),
            price_cents: product.price_cents,
            price_formatted: product.price_formatted(),
            quantity: line.quantity,
            line_total_cents,
            line_total_formatted: format_cents(line_total_cents),
        });
    }

    let total_cents = lines
        .iter()
        .try_fold(0i64, |total, line| total.checked_add(line.line_total_cents))
        .ok_or_else(total_too_large)?;
    let total_quantity: i64 = lines.iter().map(|line| i64::from(line.quantity)).sum();
    let average_cents = if total_quantity > 0 {
        total_cents / total_quantity
    } else {
        0
    };

    Ok(CartView {
        lines,
        total_quantity,
        total_cents,
        total_formatted: format_cents(total_cents),
        average_cents,
        average_formatted: format_cents(average_cents),
    })
}

fn total_too_large() -> ServiceError {
    ServiceError::Form("The cart total is too large to process".to_string())
}

/// Put one unit of a catalog product into the cart.
///
/// Fails when the product does not exist or the cart would hold more units
/// than are in stock.
pub fn add_to_cart<R>(repo: &R, cart: &mut Cart, product_id: i32) -> ServiceResult<Product>
where
    R: ProductReader + ?Sized,
{
    let product = repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)?;

    let in_cart = cart
        .lines()
        .iter()
        .find(|line| line.product_id == product_id)
        .map(|line| line.quantity)
        .unwrap_or(0);

    if in_cart >= product.quantity {
        return Err(ServiceError::Form(format!(
            "Only {} units of {} are in stock",
            product.quantity, product.name
        )));
    }

    cart.add_item(product_id, 1);
    Ok(product)
}

pub(crate) fn fetch_cart_products<R>(
    repo: &R,
    cart: &Cart,
) -> ServiceResult<HashMap<i32, Product>>
where
    R: ProductReader + ?Sized,
{
    if cart.is_empty() {
        return Ok(HashMap::new());
    }

    let products = repo
        .get_products_by_ids(&cart.product_ids())
        .map_err(ServiceError::from)?;

    Ok(products
        .into_iter()
        .map(|product| (product.id, product))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    use crate::repository::mock::MockProductReader;

    fn product(id: i32, name: &str, price_cents: i64, quantity: i32) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: None,
            price_cents,
            quantity,
            created_at: NaiveDateTime::default(),
            updated_at: NaiveDateTime::default(),
        }
    }

    #[test]
    fn load_cart_computes_total_and_average() {
        let mut repo = MockProductReader::new();
        repo.expect_get_products_by_ids()
            .times(1)
            .withf(|ids| ids.to_vec() == vec![1, 2])
            .returning(|_| {
                Ok(vec![
                    product(2, "Pen", 150, 10),
                    product(1, "Mug", 1000, 10),
                ])
            });

        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(2, 3);

        let view = load_cart(&repo, &cart).expect("expected success");

        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[0].name, "Mug");
        assert_eq!(view.lines[1].line_total_cents, 450);
        assert_eq!(view.total_quantity, 4);
        assert_eq!(view.total_cents, 1450);
        assert_eq!(view.total_formatted, "14.50");
        assert_eq!(view.average_cents, 362);
    }

    #[test]
    fn load_cart_skips_deleted_products() {
        let mut repo = MockProductReader::new();
        repo.expect_get_products_by_ids()
            .returning(|_| Ok(vec![product(1, "Mug", 1000, 10)]));

        let mut cart = Cart::new();
        cart.add_item(1, 2);
        cart.add_item(99, 1);

        let view = load_cart(&repo, &cart).expect("expected success");

        assert_eq!(view.lines.len(), 1);
        assert_eq!(view.total_cents, 2000);
        assert_eq!(view.average_cents, 1000);
    }

    #[test]
    fn load_cart_for_empty_cart_skips_repository() {
        let repo = MockProductReader::new();

        let view = load_cart(&repo, &Cart::new()).expect("expected success");

        assert!(view.is_empty());
        assert_eq!(view.total_cents, 0);
        assert_eq!(view.average_cents, 0);
    }

    #[test]
    fn load_cart_rejects_total_that_does_not_fit() {
        let mut repo = MockProductReader::new();
        repo.expect_get_products_by_ids().returning(|_| {
            Ok(vec![
                product(1, "Gold", i64::MAX, 10),
                product(2, "Pen", 100, 10),
            ])
        });

        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(2, 1);

        let result = load_cart(&repo, &cart);
        assert!(matches!(result, Err(ServiceError::Form(_))));

        let mut cart = Cart::new();
        cart.add_item(1, 2);

        let result = load_cart(&repo, &cart);
        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn add_to_cart_rejects_unknown_product() {
        let mut repo = MockProductReader::new();
        repo.expect_get_product_by_id().returning(|_| Ok(None));

        let mut cart = Cart::new();
        let result = add_to_cart(&repo, &mut cart, 5);

        assert!(matches!(result, Err(ServiceError::NotFound)));
        assert!(cart.is_empty());
    }

    #[test]
    fn add_to_cart_respects_stock() {
        let mut repo = MockProductReader::new();
        repo.expect_get_product_by_id()
            .returning(|id| Ok(Some(product(id, "Mug", 1000, 2))));

        let mut cart = Cart::new();
        add_to_cart(&repo, &mut cart, 1).expect("first unit");
        add_to_cart(&repo, &mut cart, 1).expect("second unit");
        let result = add_to_cart(&repo, &mut cart, 1);

        assert!(matches!(result, Err(ServiceError::Form(_))));
        assert_eq!(cart.total_quantity(), 2);
    }
}
