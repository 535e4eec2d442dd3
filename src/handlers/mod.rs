pub mod cart;
pub mod session;

use actix_web::HttpResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(cart::list_items, cart::add_item, cart::remove_item, cart::list_products),
    components(schemas(
        cart::AddItemRequest,
        cart::LineItemResponse,
        cart::ProductResponse,
        cart::CartResponse
    )),
    tags((name = "cart", description = "Session-scoped shopping cart"))
)]
pub struct ApiDoc;

/// GET /api-docs/openapi.json
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
