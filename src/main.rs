use std::env;

use actix_files::Files;
use actix_identity::IdentityMiddleware;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;
use actix_web::{App, HttpServer, middleware, web};
use actix_web_flash_messages::{FlashMessagesFramework, storage::CookieMessageStore};
use dotenvy::dotenv;
use pushkind_common::db::establish_connection_pool;
use pushkind_common::middleware::RedirectUnauthorized;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{logout, not_assigned};
use tera::Tera;

use pushkind_shop::repository::DieselRepository;
use pushkind_shop::routes::admin::{
    add_product, delete_product, edit_product, new_product, show_admin, show_order, show_orders,
    update_product, upload_products,
};
use pushkind_shop::routes::api::api_v1_products;
use pushkind_shop::routes::cart::{add_to_cart, remove_from_cart, show_cart};
use pushkind_shop::routes::catalog::show_catalog;
use pushkind_shop::routes::orders::{order_completed, place_order, show_checkout};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenv().ok(); // Load .env file

    let database_url = env::var("DATABASE_URL").unwrap_or("app.db".to_string());
    let port = env::var("PORT").unwrap_or("8080".to_string());
    let port = port.parse::<u16>().unwrap_or(8080);
    let address = env::var("ADDRESS").unwrap_or("127.0.0.1".to_string());

    let secret = env::var("SECRET_KEY");
    let secret_key = match &secret {
        Ok(key) => Key::from(key.as_bytes()),
        Err(_) => {
            log::warn!("SECRET_KEY not set, sessions will not survive a restart");
            Key::generate()
        }
    };

    let auth_service_url = match env::var("AUTH_SERVICE_URL") {
        Ok(auth_service_url) => auth_service_url,
        Err(_) => {
            log::error!("AUTH_SERVICE_URL environment variable not set");
            std::process::exit(1);
        }
    };

    let common_config = CommonServerConfig {
        secret: secret.unwrap_or_default(),
        auth_service_url,
    };

    let domain = env::var("DOMAIN").unwrap_or("localhost".to_string());

    let pool = match establish_connection_pool(&database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let message_store = CookieMessageStore::builder(secret_key.clone()).build();
    let message_framework = FlashMessagesFramework::builder(message_store).build();

    let tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            log::error!("Parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    log::info!("Starting shop on {address}:{port}");

    HttpServer::new(move || {
        App::new()
            .wrap(message_framework.clone())
            .wrap(IdentityMiddleware::default())
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_secure(false) // set to true in prod
                    .cookie_domain(Some(format!(".{domain}")))
                    .build(),
            )
            .wrap(middleware::Compress::default())
            .wrap(middleware::Logger::default())
            .service(Files::new("/assets", "./assets"))
            .service(not_assigned)
            .service(logout)
            .service(show_catalog)
            .service(show_cart)
            .service(add_to_cart)
            .service(remove_from_cart)
            .service(show_checkout)
            .service(place_order)
            .service(order_completed)
            .service(web::scope("/api").service(api_v1_products))
            .service(
                web::scope("/admin")
                    .wrap(RedirectUnauthorized)
                    .service(show_admin)
                    .service(new_product)
                    .service(add_product)
                    .service(edit_product)
                    .service(update_product)
                    .service(delete_product)
                    .service(upload_products)
                    .service(show_orders)
                    .service(show_order),
            )
            .app_data(web::Data::new(tera.clone()))
            .app_data(web::Data::new(repo.clone()))
            .app_data(web::Data::new(common_config.clone()))
    })
    .bind((address, port))?
    .run()
    .await
}
