use actix_session::Session;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::routes::{redirect, render_template};
use tera::Tera;

use crate::forms::orders::CheckoutForm;
use crate::repository::DieselRepository;
use crate::routes::{save_session_cart, session_cart, storefront_context};
use crate::services::{ServiceError, cart as cart_service, orders};

#[get("/order")]
pub async fn show_checkout(
    repo: web::Data<DieselRepository>,
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = session_cart(&session);
    if cart.is_empty() {
        FlashMessage::warning("Your cart is empty.").send();
        return redirect("/cart");
    }

    match cart_service::load_cart(repo.get_ref(), &cart) {
        Ok(view) => {
            let mut context = storefront_context(&flash_messages, "order", &cart);
            context.insert("cart", &view);
            render_template(&tera, "orders/checkout.html", &context)
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/cart")
        }
        Err(err) => {
            log::error!("Failed to load checkout: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/order")]
pub async fn place_order(
    repo: web::Data<DieselRepository>,
    session: Session,
    web::Form(form): web::Form<CheckoutForm>,
) -> impl Responder {
    let mut cart = session_cart(&session);

    match orders::place_order(repo.get_ref(), &cart, form) {
        Ok(_) => {
            cart.clear();
            save_session_cart(&session, &cart);
            redirect("/order/completed")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/order")
        }
        Err(err) => {
            log::error!("Failed to place an order: {err}");
            FlashMessage::error("Could not place your order.").send();
            redirect("/order")
        }
    }
}

#[get("/order/completed")]
pub async fn order_completed(
    session: Session,
    flash_messages: IncomingFlashMessages,
    tera: web::Data<Tera>,
) -> impl Responder {
    let cart = session_cart(&session);
    let context = storefront_context(&flash_messages, "order", &cart);
    render_template(&tera, "orders/completed.html", &context)
}
