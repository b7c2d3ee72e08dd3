use actix_web::{HttpResponse, Responder, get, web};

use crate::repository::DieselRepository;
use crate::services::products;

#[get("/v1/products")]
/// Return a JSON page of catalog products with optional search and pagination.
pub async fn api_v1_products(
    params: web::Query<products::ProductsQuery>,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    match products::load_catalog_page(repo.get_ref(), params.into_inner()) {
        Ok(data) => HttpResponse::Ok().json(data.products),
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
