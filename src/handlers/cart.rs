use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::commands::CartCommands;
use crate::domain::cart::{CartItem, LineItemView, ProductView};
use crate::errors::AppError;

use super::session::Session;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddItemRequest {
    pub product: String,
    /// Positive whole number, sent as text, e.g. "2"
    pub quantity: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LineItemResponse {
    pub id: i64,
    pub product: String,
    pub quantity: i32,
    /// Decimal line price as a string, e.g. "300"
    pub price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub name: String,
    pub unit_price: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartResponse {
    pub items: Vec<LineItemResponse>,
    pub products: Vec<ProductResponse>,
}

impl From<LineItemView> for LineItemResponse {
    fn from(view: LineItemView) -> Self {
        Self {
            id: view.id,
            product: view.product_name,
            quantity: view.quantity,
            price: view.price.to_string(),
        }
    }
}

impl From<CartItem> for LineItemResponse {
    fn from(item: CartItem) -> Self {
        LineItemView::from(item).into()
    }
}

impl From<ProductView> for ProductResponse {
    fn from(product: ProductView) -> Self {
        Self {
            name: product.name,
            unit_price: product.unit_price.to_string(),
        }
    }
}

fn blocking_failed(e: actix_web::error::BlockingError) -> AppError {
    AppError::Internal(e.to_string())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /cart
///
/// Returns the visitor's line items (newest first) alongside the product
/// catalogue. A visitor without a cart gets an empty item list.
#[utoipa::path(
    get,
    path = "/cart",
    responses(
        (status = 200, description = "Current cart contents", body = CartResponse),
    ),
    tag = "cart"
)]
pub async fn list_items(
    req: HttpRequest,
    commands: web::Data<dyn CartCommands>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req);
    let session_id = session.id.clone();

    let (items, products) =
        web::block(move || (commands.list_items(&session_id), commands.products()))
            .await
            .map_err(blocking_failed)?;

    let body = CartResponse {
        items: items.into_iter().map(LineItemResponse::from).collect(),
        products: products.into_iter().map(ProductResponse::from).collect(),
    };
    Ok(session.attach(HttpResponse::Ok()).json(body))
}

/// POST /cart/items
///
/// Adds a product to the visitor's open cart, creating the cart on first use
/// and merging into an existing line for the same product.
#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Line item created or merged", body = LineItemResponse),
        (status = 400, description = "Unknown product or invalid quantity"),
        (status = 500, description = "Internal server error"),
    ),
    tag = "cart"
)]
pub async fn add_item(
    req: HttpRequest,
    commands: web::Data<dyn CartCommands>,
    body: web::Json<AddItemRequest>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req);
    let session_id = session.id.clone();
    let body = body.into_inner();

    let item = web::block(move || commands.add_item(&session_id, &body.product, &body.quantity))
        .await
        .map_err(blocking_failed)??;

    Ok(session
        .attach(HttpResponse::Created())
        .json(LineItemResponse::from(item)))
}

/// DELETE /cart/items/{id}
///
/// Removes a line from the visitor's open cart. Ids that are unknown or
/// belong to another visitor are silently ignored.
#[utoipa::path(
    delete,
    path = "/cart/items/{id}",
    params(
        ("id" = i64, Path, description = "Cart item id"),
    ),
    responses(
        (status = 204, description = "Item removed (or was not in the cart)"),
        (status = 500, description = "No open cart or internal server error"),
    ),
    tag = "cart"
)]
pub async fn remove_item(
    req: HttpRequest,
    commands: web::Data<dyn CartCommands>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let session = Session::from_request(&req);
    let session_id = session.id.clone();
    let cart_item_id = path.into_inner();

    web::block(move || commands.remove_item(&session_id, cart_item_id))
        .await
        .map_err(blocking_failed)??;

    Ok(session.attach(HttpResponse::NoContent()).finish())
}

/// GET /products
#[utoipa::path(
    get,
    path = "/products",
    responses(
        (status = 200, description = "Product catalogue", body = [ProductResponse]),
    ),
    tag = "cart"
)]
pub async fn list_products(commands: web::Data<dyn CartCommands>) -> HttpResponse {
    let products: Vec<ProductResponse> = commands
        .products()
        .into_iter()
        .map(ProductResponse::from)
        .collect();
    HttpResponse::Ok().json(products)
}
