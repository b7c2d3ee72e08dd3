use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use pushkind_common::repository::errors::RepositoryError;
use pushkind_common::routes::check_role;
use serde::Deserialize;

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::cart::Cart;
use crate::domain::order::{NewOrder, Order, OrderLine, OrderListQuery};
use crate::forms::orders::CheckoutForm;
use crate::repository::{OrderReader, OrderWriter, ProductReader};
use crate::services::cart::fetch_cart_products;
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the admin orders page.
#[derive(Debug, Default, Deserialize)]
pub struct OrdersQuery {
    pub search: Option<String>,
    pub page: Option<usize>,
}

/// Data required to render the admin orders template.
pub struct OrdersPageData {
    pub orders: Paginated<Order>,
    pub search: Option<String>,
}

/// Turn the cart into an order.
///
/// Prices and names are taken from the catalog at this moment. The cart is
/// left untouched; callers clear it once the order is stored.
pub fn place_order<R>(repo: &R, cart: &Cart, form: CheckoutForm) -> ServiceResult<Order>
where
    R: ProductReader + OrderWriter + ?Sized,
{
    if cart.is_empty() {
        return Err(ServiceError::Form("Your cart is empty".to_string()));
    }

    let details = form
        .into_delivery_details()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let products = fetch_cart_products(repo, cart)?;

    let mut lines = Vec::with_capacity(cart.lines().len());
    for line in cart.lines() {
        let Some(product) = products.get(&line.product_id) else {
            return Err(ServiceError::Form(
                "A product in your cart is no longer available".to_string(),
            ));
        };

        if line.quantity > product.quantity {
            return Err(ServiceError::Form(format!(
                "Only {} units of {} are in stock",
                product.quantity, product.name
            )));
        }

        lines.push(OrderLine {
            product_id: Some(product.id),
            name: product.name.clone(),
            price_cents: product.price_cents,
            quantity: line.quantity,
        });
    }

    let new_order = NewOrder {
        name: details.name,
        address: details.address,
        city: details.city,
        zip: details.zip,
        country: details.country,
        lines,
    };

    if new_order.total_cents().is_none() {
        return Err(ServiceError::Form(
            "The order total is too large to process".to_string(),
        ));
    }

    let order = repo.create_order(&new_order).map_err(|err| match err {
        // Stock changed between the check above and the write.
        RepositoryError::NotFound => {
            ServiceError::Form("A product in your cart is no longer available".to_string())
        }
        other => ServiceError::from(other),
    })?;

    log::info!(
        "Order {} placed with {} lines, total {}",
        order.id,
        order.lines.len(),
        order.total_formatted()
    );

    Ok(order)
}

/// Loads the admin orders list.
pub fn load_orders_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: OrdersQuery,
) -> ServiceResult<OrdersPageData>
where
    R: OrderReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    let page = query.page.unwrap_or(1).max(1);
    let mut list_query = OrderListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(value) = query.search.as_ref() {
        list_query = list_query.search(value);
    }

    let (total, orders) = repo.list_orders(list_query).map_err(ServiceError::from)?;

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let orders = Paginated::new(orders, page, total_pages);

    Ok(OrdersPageData {
        orders,
        search: query.search,
    })
}

/// Loads a single order for the admin detail page.
pub fn load_order<R>(repo: &R, user: &AuthenticatedUser, order_id: i32) -> ServiceResult<Order>
where
    R: OrderReader + ?Sized,
{
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return Err(ServiceError::Unauthorized);
    }

    repo.get_order_by_id(order_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use pushkind_common::repository::errors::RepositoryResult;

    use crate::domain::product::{Product, ProductListQuery};
    use crate::repository::mock::{MockOrderReader, MockOrderWriter, MockProductReader};

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

    fn checkout_form() -> CheckoutForm {
        CheckoutForm {
            name: "Jane Doe".to_string(),
            address: "1 Main St".to_string(),
            city: "Springfield".to_string(),
            zip: "12345".to_string(),
            country: "US".to_string(),
        }
    }

    fn order_from(id: i32, new_order: &NewOrder) -> Order {
        Order {
            id,
            name: new_order.name.clone(),
            address: new_order.address.clone(),
            city: new_order.city.clone(),
            zip: new_order.zip.clone(),
            country: new_order.country.clone(),
            total_cents: new_order.total_cents().unwrap_or_default(),
            lines: new_order.lines.clone(),
            created_at: NaiveDateTime::default(),
        }
    }

    fn user_with_roles(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user".to_string(),
            email: "user@example.com".to_string(),
            hub_id: 1,
            name: "User".to_string(),
            roles: roles.iter().map(|role| (*role).to_string()).collect(),
            exp: 0,
        }
    }

    struct FakeRepo {
        product_reader: MockProductReader,
        order_writer: MockOrderWriter,
    }

    impl FakeRepo {
        fn new() -> Self {
            Self {
                product_reader: MockProductReader::new(),
                order_writer: MockOrderWriter::new(),
            }
        }
    }

    impl ProductReader for FakeRepo {
        fn get_product_by_id(&self, id: i32) -> RepositoryResult<Option<Product>> {
            self.product_reader.get_product_by_id(id)
        }

        fn get_products_by_ids(&self, ids: &[i32]) -> RepositoryResult<Vec<Product>> {
            self.product_reader.get_products_by_ids(ids)
        }

        fn list_products(
            &self,
            query: ProductListQuery,
        ) -> RepositoryResult<(usize, Vec<Product>)> {
            self.product_reader.list_products(query)
        }
    }

    impl OrderWriter for FakeRepo {
        fn create_order(&self, new_order: &NewOrder) -> RepositoryResult<Order> {
            self.order_writer.create_order(new_order)
        }
    }

    #[test]
    fn place_order_rejects_empty_cart() {
        let repo = FakeRepo::new();

        let result = place_order(&repo, &Cart::new(), checkout_form());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn place_order_rejects_invalid_delivery_details() {
        let repo = FakeRepo::new();
        let mut cart = Cart::new();
        cart.add_item(1, 1);

        let form = CheckoutForm {
            country: String::new(),
            ..checkout_form()
        };

        let result = place_order(&repo, &cart, form);

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn place_order_rejects_quantities_above_stock() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_products_by_ids()
            .returning(|_| Ok(vec![product(1, "Mug", 1000, 2)]));

        let mut cart = Cart::new();
        cart.add_item(1, 3);

        match place_order(&repo, &cart, checkout_form()) {
            Err(ServiceError::Form(message)) => assert!(message.contains("Only 2 units")),
            other => panic!("expected form error, got {other:?}"),
        }
    }

    #[test]
    fn place_order_rejects_vanished_products() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_products_by_ids()
            .returning(|_| Ok(Vec::new()));

        let mut cart = Cart::new();
        cart.add_item(1, 1);

        let result = place_order(&repo, &cart, checkout_form());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn place_order_rejects_total_that_does_not_fit() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_products_by_ids()
            .returning(|_| Ok(vec![product(1, "Gold", i64::MAX, 5), product(2, "Pen", 100, 5)]));
        repo.order_writer.expect_create_order().never();

        let mut cart = Cart::new();
        cart.add_item(1, 1);
        cart.add_item(2, 1);

        match place_order(&repo, &cart, checkout_form()) {
            Err(ServiceError::Form(message)) => assert!(message.contains("too large")),
            other => panic!("expected form error, got {other:?}"),
        }
    }

    #[test]
    fn place_order_snapshots_catalog_prices() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_products_by_ids()
            .returning(|_| Ok(vec![product(1, "Mug", 1000, 5), product(2, "Pen", 150, 5)]));

        repo.order_writer
            .expect_create_order()
            .times(1)
            .withf(|new_order| {
                assert_eq!(new_order.name, "Jane Doe");
                assert_eq!(new_order.lines.len(), 2);
                assert_eq!(new_order.lines[0].name, "Mug");
                assert_eq!(new_order.lines[0].quantity, 2);
                assert_eq!(new_order.lines[1].price_cents, 150);
                assert_eq!(new_order.total_cents(), Some(2150));
                true
            })
            .returning(|new_order| Ok(order_from(7, new_order)));

        let mut cart = Cart::new();
        cart.add_item(1, 2);
        cart.add_item(2, 1);

        let order = place_order(&repo, &cart, checkout_form()).expect("expected success");

        assert_eq!(order.id, 7);
        assert_eq!(order.total_cents, 2150);
    }

    #[test]
    fn place_order_maps_stock_race_to_form_error() {
        let mut repo = FakeRepo::new();
        repo.product_reader
            .expect_get_products_by_ids()
            .returning(|_| Ok(vec![product(1, "Mug", 1000, 5)]));
        repo.order_writer
            .expect_create_order()
            .returning(|_| Err(RepositoryError::NotFound));

        let mut cart = Cart::new();
        cart.add_item(1, 1);

        let result = place_order(&repo, &cart, checkout_form());

        assert!(matches!(result, Err(ServiceError::Form(_))));
    }

    #[test]
    fn load_orders_page_requires_role() {
        let repo = MockOrderReader::new();
        let user = user_with_roles(&[]);

        let result = load_orders_page(&repo, &user, OrdersQuery::default());

        assert!(matches!(result, Err(ServiceError::Unauthorized)));
    }

    #[test]
    fn load_order_returns_not_found() {
        let mut repo = MockOrderReader::new();
        repo.expect_get_order_by_id().returning(|_| Ok(None));
        let user = user_with_roles(&[SERVICE_ACCESS_ROLE]);

        let result = load_order(&repo, &user, 3);

        assert!(matches!(result, Err(ServiceError::NotFound)));
    }
}
