use actix_session::Session;
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages, Level};
use pushkind_common::domain::auth::AuthenticatedUser;
use serde::Serialize;
use tera::Context;

use crate::domain::cart::Cart;

pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod orders;

/// Session key holding the visitor's cart.
const CART_SESSION_KEY: &str = "cart";

#[derive(Serialize)]
struct FlashView<'a> {
    level: &'static str,
    content: &'a str,
}

fn level_class(level: Level) -> &'static str {
    match level {
        Level::Error => "danger",
        Level::Warning => "warning",
        Level::Success => "success",
        Level::Info | Level::Debug => "info",
    }
}

fn flash_views<'a>(messages: impl Iterator<Item = &'a FlashMessage>) -> Vec<FlashView<'a>> {
    messages
        .map(|message| FlashView {
            level: level_class(message.level()),
            content: message.content(),
        })
        .collect()
}

/// Context shared by every page: pending flash messages under `flash` and the
/// active navigation entry.
fn page_context(flash: &[FlashView], current_page: &str) -> Context {
    let mut context = Context::new();
    context.insert("flash", flash);
    context.insert("current_page", current_page);
    context
}

/// Base context for pages that do not require a signed-in user.
pub fn storefront_context(
    flash_messages: &IncomingFlashMessages,
    current_page: &str,
    cart: &Cart,
) -> Context {
    let mut context = page_context(&flash_views(flash_messages.iter()), current_page);
    context.insert("cart_quantity", &cart.total_quantity());
    context
}

/// Base context for the admin area.
pub fn admin_context(
    flash_messages: &IncomingFlashMessages,
    user: &AuthenticatedUser,
    current_page: &str,
    home_url: &str,
) -> Context {
    admin_page_context(
        &flash_views(flash_messages.iter()),
        user,
        current_page,
        home_url,
    )
}

fn admin_page_context(
    flash: &[FlashView],
    user: &AuthenticatedUser,
    current_page: &str,
    home_url: &str,
) -> Context {
    let mut context = page_context(flash, current_page);
    context.insert("user", user);
    context.insert("home_url", home_url);
    context
}

/// Read the cart from the session, starting over when it is missing or unreadable.
pub fn session_cart(session: &Session) -> Cart {
    match session.get::<Cart>(CART_SESSION_KEY) {
        Ok(Some(cart)) => cart,
        Ok(None) => Cart::new(),
        Err(err) => {
            log::warn!("Discarding unreadable cart session: {err}");
            Cart::new()
        }
    }
}

/// Store the cart in the session.
pub fn save_session_cart(session: &Session, cart: &Cart) {
    if let Err(err) = session.insert(CART_SESSION_KEY, cart) {
        log::error!("Failed to store cart in session: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            sub: "user".to_string(),
            email: "admin@example.com".to_string(),
            hub_id: 1,
            name: "Admin".to_string(),
            roles: vec!["admin".to_string()],
            exp: 0,
        }
    }

    #[test]
    fn admin_context_lists_each_flash_message_once() {
        let messages = vec![
            FlashMessage::new("Product Mug added.".to_string(), Level::Success),
            FlashMessage::new("Product not found.".to_string(), Level::Error),
        ];
        let flash = flash_views(messages.iter());

        let context = admin_page_context(&flash, &user(), "admin", "https://auth.example.com");
        let json = context.into_json();

        let entries = json["flash"].as_array().expect("flash list");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["level"], "success");
        assert_eq!(entries[1]["level"], "danger");
        assert_eq!(entries[1]["content"], "Product not found.");
        assert_eq!(json["current_page"], "admin");
        assert_eq!(json["user"]["email"], "admin@example.com");

        // No other key carries the messages.
        let rendered = json.to_string();
        assert_eq!(rendered.matches("Product not found.").count(), 1);
    }

    #[test]
    fn page_context_without_messages_has_empty_flash() {
        let json = page_context(&[], "catalog").into_json();

        assert_eq!(json["flash"].as_array().map(Vec::len), Some(0));
        assert_eq!(json["current_page"], "catalog");
    }
}
