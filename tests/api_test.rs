//! End-to-end test: real HTTP socket → actix-web → cart service → in-memory
//! repository.
//!
//! Runs without any external infrastructure:
//!
//!   cargo test --test api_test

use std::sync::Arc;
use std::time::Duration;

use cart_service::application::cart_service::CartService;
use cart_service::application::commands::CartCommands;
use cart_service::build_server;
use cart_service::domain::pricing::PriceTable;
use cart_service::infrastructure::memory::InMemoryCartRepository;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind failed")
        .local_addr()
        .expect("addr failed")
        .port()
}

/// Wait until `url` answers at all, retrying every `interval` for up to
/// `timeout` total. Panics if the service never comes up.
async fn wait_for_http(url: &str, timeout: Duration, interval: Duration) {
    let client = Client::new();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            panic!("cart service did not become ready within {:?}", timeout);
        }
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(interval).await;
    }
}

async fn start_server() -> String {
    let port = free_port();
    let commands: Arc<dyn CartCommands> = Arc::new(CartService::new(
        InMemoryCartRepository::new(),
        PriceTable::default(),
    ));
    let server =
        build_server(commands, "127.0.0.1", port, Some(1)).expect("Failed to bind the cart service");
    tokio::spawn(server);

    let app_url = format!("http://127.0.0.1:{}", port);
    wait_for_http(
        &format!("{}/products", app_url),
        Duration::from_secs(10),
        Duration::from_millis(100),
    )
    .await;
    app_url
}

/// Full visitor flow:
///  1. First visit mints a session cookie and shows an empty cart.
///  2. Adding "watch" twice merges into one line with qty 3, price 900.
///  3. A second visitor cannot see or delete the first visitor's line.
///  4. The owner deletes the line and the cart is empty again.
#[tokio::test]
async fn cart_flow_over_http() {
    let app_url = start_server().await;
    let http = Client::new();

    // ── 1. First visit ───────────────────────────────────────────────────────
    let resp = http
        .get(format!("{}/cart", app_url))
        .send()
        .await
        .expect("Failed to GET /cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let set_cookie = resp
        .headers()
        .get(SET_COOKIE)
        .expect("first visit should mint a session cookie")
        .to_str()
        .expect("cookie header is ascii")
        .to_string();
    let session_cookie = set_cookie
        .split(';')
        .next()
        .expect("cookie has a name=value pair")
        .to_string();

    let body: Value = resp.json().await.expect("cart body is json");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));

    // ── 2. Add and merge ─────────────────────────────────────────────────────
    for quantity in ["1", "2"] {
        let resp = http
            .post(format!("{}/cart/items", app_url))
            .header(COOKIE, &session_cookie)
            .json(&json!({ "product": "watch", "quantity": quantity }))
            .send()
            .await
            .expect("Failed to POST /cart/items");
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let body: Value = http
        .get(format!("{}/cart", app_url))
        .header(COOKIE, &session_cookie)
        .send()
        .await
        .expect("Failed to GET /cart")
        .json()
        .await
        .expect("cart body is json");
    let items = body["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1, "repeated adds merge into one line");
    assert_eq!(items[0]["product"], "watch");
    assert_eq!(items[0]["quantity"], 3);
    assert_eq!(items[0]["price"], "900");
    let item_id = items[0]["id"].as_i64().expect("numeric id");

    // ── 3. Another visitor ───────────────────────────────────────────────────
    let other = "cart_session_id=someone-else";
    let resp = http
        .post(format!("{}/cart/items", app_url))
        .header(COOKIE, other)
        .json(&json!({ "product": "shoe", "quantity": "1" }))
        .send()
        .await
        .expect("Failed to POST /cart/items");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = http
        .delete(format!("{}/cart/items/{}", app_url, item_id))
        .header(COOKIE, other)
        .send()
        .await
        .expect("Failed to DELETE /cart/items");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body: Value = http
        .get(format!("{}/cart", app_url))
        .header(COOKIE, &session_cookie)
        .send()
        .await
        .expect("Failed to GET /cart")
        .json()
        .await
        .expect("cart body is json");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(1));

    // ── 4. Owner deletes ─────────────────────────────────────────────────────
    let resp = http
        .delete(format!("{}/cart/items/{}", app_url, item_id))
        .header(COOKIE, &session_cookie)
        .send()
        .await
        .expect("Failed to DELETE /cart/items");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let body: Value = http
        .get(format!("{}/cart", app_url))
        .header(COOKIE, &session_cookie)
        .send()
        .await
        .expect("Failed to GET /cart")
        .json()
        .await
        .expect("cart body is json");
    assert_eq!(body["items"].as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn invalid_quantity_is_rejected_over_http() {
    let app_url = start_server().await;

    let resp = Client::new()
        .post(format!("{}/cart/items", app_url))
        .header(COOKIE, "cart_session_id=visitor")
        .json(&json!({ "product": "shoe", "quantity": "-1" }))
        .send()
        .await
        .expect("Failed to POST /cart/items");

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("error body is json");
    assert!(body["error"]
        .as_str()
        .is_some_and(|msg| msg.contains("quantity")));
}
