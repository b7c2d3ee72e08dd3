use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, web};
use actix_web_flash_messages::IncomingFlashMessages;
use pushkind_common::routes::render_template;
use tera::Tera;

use crate::repository::DieselRepository;
use crate::routes::{session_cart, storefront_context};
use crate::services::products;

#[get("/")]
pub async fn show_catalog(
    params: web::Query<products::ProductsQuery>,
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    match products::load_catalog_page(repo.get_ref(), params.into_inner()) {
        Ok(data) => {
            let cart = session_cart(&session);
            let mut context = storefront_context(&flash_messages, "catalog", &cart);
            context.insert("products", &data.products);
            context.insert("search", &data.search);
            render_template(&tera, "catalog/index.html", &context)
        }
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
