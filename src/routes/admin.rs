use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, Responder, get, post, web};
use actix_web_flash_messages::{FlashMessage, IncomingFlashMessages};
use pushkind_common::domain::auth::AuthenticatedUser;
use pushkind_common::models::config::CommonServerConfig;
use pushkind_common::routes::{check_role, redirect, render_template};
use tera::Tera;

use crate::SERVICE_ACCESS_ROLE;
use crate::forms::products::{ProductForm, UploadProductsForm};
use crate::repository::DieselRepository;
use crate::routes::admin_context;
use crate::services::orders::OrdersQuery;
use crate::services::products::ProductsQuery;
use crate::services::{ServiceError, orders, products};

fn unauthorized() -> HttpResponse {
    FlashMessage::error("Insufficient permissions.").send();
    redirect("/na")
}

#[get("")]
pub async fn show_admin(
    params: web::Query<ProductsQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match products::load_admin_page(repo.get_ref(), &user, params.into_inner()) {
        Ok(data) => {
            let mut context = admin_context(
                &flash_messages,
                &user,
                "admin",
                &server_config.auth_service_url,
            );
            context.insert("products", &data.products);
            context.insert("search", &data.search);
            render_template(&tera, "admin/index.html", &context)
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(err) => {
            log::error!("Failed to list products: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/products/new")]
pub async fn new_product(
    user: AuthenticatedUser,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    if !check_role(SERVICE_ACCESS_ROLE, &user.roles) {
        return unauthorized();
    }

    let mut context = admin_context(
        &flash_messages,
        &user,
        "admin",
        &server_config.auth_service_url,
    );
    context.insert("form_action", "/admin/products");
    context.insert("product", &Option::<products::ProductView>::None);
    render_template(&tera, "admin/product_form.html", &context)
}

#[post("/products")]
pub async fn add_product(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ProductForm>,
) -> impl Responder {
    match products::create_product(repo.get_ref(), &user, form) {
        Ok(product) => {
            FlashMessage::success(format!("Product {} added.", product.name)).send();
            redirect("/admin")
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/admin/products/new")
        }
        Err(err) => {
            log::error!("Failed to add a product: {err}");
            FlashMessage::error("Error while adding the product.").send();
            redirect("/admin")
        }
    }
}

#[get("/products/{product_id}/edit")]
pub async fn edit_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let product_id = product_id.into_inner();

    match products::load_product(repo.get_ref(), &user, product_id) {
        Ok(product) => {
            let mut context = admin_context(
                &flash_messages,
                &user,
                "admin",
                &server_config.auth_service_url,
            );
            context.insert(
                "form_action",
                &format!("/admin/products/{product_id}/edit"),
            );
            context.insert("product", &Some(products::ProductView::from(product)));
            render_template(&tera, "admin/product_form.html", &context)
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/admin")
        }
        Err(err) => {
            log::error!("Failed to load product {product_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[post("/products/{product_id}/edit")]
pub async fn update_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Form(form): web::Form<ProductForm>,
) -> impl Responder {
    let product_id = product_id.into_inner();

    match products::update_product(repo.get_ref(), &user, product_id, form) {
        Ok(product) => {
            FlashMessage::success(format!("Product {} updated.", product.name)).send();
            redirect("/admin")
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/admin")
        }
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect(&format!("/admin/products/{product_id}/edit"))
        }
        Err(err) => {
            log::error!("Failed to update product {product_id}: {err}");
            FlashMessage::error("Error while updating the product.").send();
            redirect("/admin")
        }
    }
}

#[post("/products/{product_id}/delete")]
pub async fn delete_product(
    product_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> impl Responder {
    let product_id = product_id.into_inner();

    match products::delete_product(repo.get_ref(), &user, product_id) {
        Ok(()) => {
            FlashMessage::success("Product deleted.").send();
            redirect("/admin")
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Product not found.").send();
            redirect("/admin")
        }
        Err(err) => {
            log::error!("Failed to delete product {product_id}: {err}");
            FlashMessage::error("Error while deleting the product.").send();
            redirect("/admin")
        }
    }
}

#[post("/products/upload")]
pub async fn upload_products(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(mut form): MultipartForm<UploadProductsForm>,
) -> impl Responder {
    match products::import_products(repo.get_ref(), &user, &mut form) {
        Ok(count) => {
            FlashMessage::success(format!("{count} products imported.")).send();
            redirect("/admin")
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::Form(message)) => {
            FlashMessage::error(message).send();
            redirect("/admin")
        }
        Err(err) => {
            log::error!("Failed to import products: {err}");
            FlashMessage::error("Error while importing products.").send();
            redirect("/admin")
        }
    }
}

#[get("/orders")]
pub async fn show_orders(
    params: web::Query<OrdersQuery>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    match orders::load_orders_page(repo.get_ref(), &user, params.into_inner()) {
        Ok(data) => {
            let mut context = admin_context(
                &flash_messages,
                &user,
                "orders",
                &server_config.auth_service_url,
            );
            context.insert("orders", &data.orders);
            context.insert("search", &data.search);
            render_template(&tera, "admin/orders.html", &context)
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(err) => {
            log::error!("Failed to list orders: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

#[get("/orders/{order_id}")]
pub async fn show_order(
    order_id: web::Path<i32>,
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    flash_messages: IncomingFlashMessages,
    server_config: web::Data<CommonServerConfig>,
    tera: web::Data<Tera>,
) -> impl Responder {
    let order_id = order_id.into_inner();

    match orders::load_order(repo.get_ref(), &user, order_id) {
        Ok(order) => {
            let mut context = admin_context(
                &flash_messages,
                &user,
                "orders",
                &server_config.auth_service_url,
            );
            context.insert("total_formatted", &order.total_formatted());
            context.insert("order", &order);
            render_template(&tera, "admin/order.html", &context)
        }
        Err(ServiceError::Unauthorized) => unauthorized(),
        Err(ServiceError::NotFound) => {
            FlashMessage::error("Order not found.").send();
            redirect("/admin/orders")
        }
        Err(err) => {
            log::error!("Failed to load order {order_id}: {err}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
