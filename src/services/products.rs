use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::pagination::{DEFAULT_ITEMS_PER_PAGE, Paginated};
use pushkind_common::routes::check_role;
use serde::{Deserialize, Serialize};

use crate::SERVICE_ACCESS_ROLE;
use crate::domain::product::{Product, ProductListQuery};
use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::{ProductReader, ProductWriter};
use crate::services::{ServiceError, ServiceResult};

/// Query parameters accepted by the catalog and admin product lists.
#[derive(Debug, Default, Deserialize)]
pub struct ProductsQuery {
    /// Optional search string entered by the user.
    pub search: Option<String>,
    /// Page requested by the UI (1-based).
    pub page: Option<usize>,
}

/// Data required to render a product list.
pub struct ProductsPageData {
    /// Paginated list of products displayed in the table.
    pub products: Paginated<ProductView>,
    /// Search query echoed back to the view when present.
    pub search: Option<String>,
}

/// View model exposed to the product templates and the JSON API.
#[derive(Debug, Serialize)]
pub struct ProductView {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub price_formatted: String,
    pub quantity: i32,
}

impl From<Product> for ProductView {
    fn from(product: Product) -> Self {
        let price_formatted = product.price_formatted();
        let Product {
            id,
            name,
            description,
            price_cents,
            quantity,
            ..
        } = product;

        Self {
            id,
            name,
            description,
            price_cents,
            price_formatted,
            quantity,
        }
    }
}

/// Loads the public catalog page.
pub fn load_catalog_page<R>(repo: &R, query: ProductsQuery) -> ServiceResult<ProductsPageData>
where
    R: ProductReader + ?Sized,
{
    let ProductsQuery { search, page } = query;
    let search = search
        .map(|term| term.trim().to_string())
        .filter(|term| !term.is_empty());

    let page = page.unwrap_or(1).max(1);
    let mut list_query = ProductListQuery::new().paginate(page, DEFAULT_ITEMS_PER_PAGE);

    if let Some(search_term) = search.as_ref() {
        list_query = list_query.search(search_term);
    }

    let (total, items) = repo.list_products(list_query).map_err(ServiceError::from)?;

    let view_items: Vec<ProductView> = items.into_iter().map(ProductView::from).collect();

    let total_pages = total.div_ceil(DEFAULT_ITEMS_PER_PAGE);
    let products = Paginated::new(view_items, page, total_pages);

    Ok(ProductsPageData { products, search })
}

/// Loads the admin product management page.
pub fn load_admin_page<R>(
    repo: &R,
    user: &AuthenticatedUser,
    query: ProductsQuery,
) -> ServiceResult<ProductsPageData>
where
    R: ProductReader + ?Sized,
{
    ensure_admin(user)?;
    load_catalog_page(repo, query)
}

/// Creates a new product from the admin form.
pub fn create_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let payload = form
        .into_new_product()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let created = repo.create_product(&payload).map_err(ServiceError::from)?;
    log::info!(
        "Product {} `{}` created by {}",
        created.id,
        created.name,
        user.email
    );

    Ok(created)
}

/// Loads a single product for the edit form.
pub fn load_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
) -> ServiceResult<Product>
where
    R: ProductReader + ?Sized,
{
    ensure_admin(user)?;

    repo.get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .ok_or(ServiceError::NotFound)
}

/// Replaces the fields of an existing product after validating them again.
pub fn update_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
    form: ProductForm,
) -> ServiceResult<Product>
where
    R: ProductReader + ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let updates = form
        .into_update_product()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    if repo
        .get_product_by_id(product_id)
        .map_err(ServiceError::from)?
        .is_none()
    {
        return Err(ServiceError::NotFound);
    }

    repo.update_product(product_id, &updates)
        .map_err(ServiceError::from)
}

/// Removes a product from the catalog.
pub fn delete_product<R>(
    repo: &R,
    user: &AuthenticatedUser,
    product_id: i32,
) -> ServiceResult<()>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    repo.delete_product(product_id).map_err(ServiceError::from)?;
    log::info!("Product {product_id} deleted by {}", user.email);

    Ok(())
}

/// Imports products from an uploaded CSV file.
///
/// Every row is validated before anything is stored; one invalid row rejects the upload.
pub fn import_products<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: &mut UploadProductsForm,
) -> ServiceResult<usize>
where
    R: ProductWriter + ?Sized,
{
    ensure_admin(user)?;

    let products = form
        .parse()
        .map_err(|err| ServiceError::Form(err.to_string()))?;

    let created = repo
        .create_products(&products)
        .map_err(ServiceError::from)?;
    log::info!("{created} products imported by {}", user.email);

    Ok(created)
}

fn ensure_admin(user: &AuthenticatedUser) -> ServiceResult<()> {
    if check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized)
    }
}
