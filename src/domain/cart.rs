use serde::{Deserialize, Serialize};

/// A single cart entry referencing a catalog product.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: i32,
    pub quantity: i32,
}

/// Shopping cart kept in the visitor's session.
///
/// The cart only stores product identifiers and quantities; prices and
/// names are resolved against the catalog whenever the cart is shown or
/// checked out.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of a product, merging with an existing line.
    pub fn add_item(&mut self, product_id: i32, quantity: i32) {
        match self
            .lines
            .iter_mut()
            .find(|line| line.product_id == product_id)
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.lines.push(CartLine {
                product_id,
                quantity,
            }),
        }
    }

    /// Drop the line for `product_id`; no-op when the product is not in the cart.
    pub fn remove_line(&mut self, product_id: i32) {
        self.lines.retain(|line| line.product_id != product_id);
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Identifiers of every product referenced by the cart, in insertion order.
    pub fn product_ids(&self) -> Vec<i32> {
        self.lines.iter().map(|line| line.product_id).collect()
    }

    /// Total number of units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|line| i64::from(line.quantity)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_item_merges_lines_for_same_product() {
        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(2, 3);
        cart.add_item(1, 2);

        assert_eq!(
            cart.lines(),
            &[
                CartLine {
                    product_id: 1,
                    quantity: 3
                },
                CartLine {
                    product_id: 2,
                    quantity: 3
                },
            ]
        );
        assert_eq!(cart.total_quantity(), 6);
    }

    #[test]
    fn remove_line_drops_only_matching_product() {
        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(2, 1);

        cart.remove_line(1);
        cart.remove_line(42);

        assert_eq!(cart.product_ids(), vec![2]);
    }

    #[test]
    fn clear_empties_cart() {
        let mut cart = Cart::new();
        cart.add_item(5, 2);
        assert!(!cart.is_empty());

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.total_quantity(), 0);
    }

    #[test]
    fn cart_survives_json_round_trip_for_session_storage() {
        let mut cart = Cart::new();
        cart.add_item(9, 4);

        let json = serde_json::to_string(&cart).expect("serialize");
        let restored: Cart = serde_json::from_str(&json).expect("deserialize");

        assert_eq!(restored, cart);
    }
}
