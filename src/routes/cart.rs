use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use tera::Tera;

use crate::repository::DieselRepository;
use crate::routes::{save_session_cart, session_cart, storefront_context};
use crate::services::{ServiceError, cart as cart_service};

#[get("/cart")]
pub async fn show_cart(
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let mut cart = session_cart(&session);

    match cart_service::load_cart(repo.get_ref(), &cart) {
        Ok(view) => {
            let mut context = storefront_context(&flash_messages, "cart", &cart);
            context.insert("cart", &view);
            render_template(&tera, "cart/index.html", &context)
        }
        Err(ServiceError::Form(message)) => {
            cart.clear();
            save_session_cart(&session, &cart);
            FlashMessage::error(format!("{message}. Your cart was emptied.")).send();
            redirect("/")
        }
        Err(err) => {
            log::error!("Failed to load cart: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/cart/add/{product_id}")]
pub async fn add_to_cart(
    product_id: web::Path<i32>,
    repo: web::Data<DieselRepository>,
    session: Session,
) -> impl Responder {
    let mut cart = session_cart(&session);

    match cart_service::add_to_cart(repo.get_ref(), &mut cart, product_id.into_inner()) {
        Ok(product) => {
            save_session_cart(&session, &cart);
            FlashMessage::success(format!("{} added to your cart.", product.name)).send();
            redirect("/cart")
        }
        Err(ServiceError::NotFound) => {
            FlashMessage::error("This product is no longer available.").send();
            redirect("/")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::warning(message).send();
            redirect("/cart")
        }
        Err(err) => {
            log::error!("Failed to add a product to the cart: {err}");
            FlashMessage::error("Could not add the product to your cart.").send();
            redirect("/")
        }
    }
}

#[post("/cart/remove/{product_id}")]
pub async fn remove_from_cart(product_id: web::Path<i32>, session: Session) -> impl Responder {
    let mut cart = session_cart(&session);
    cart.remove_line(product_id.into_inner());
    save_session_cart(&session, &cart);
    redirect("/cart")
}
