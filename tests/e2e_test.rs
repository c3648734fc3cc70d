//! End-to-end test: a full order lifecycle over HTTP against a server backed
//! by the in-memory store.
//!
//!   cargo test --test e2e_test

use std::sync::Arc;
use std::time::Duration;

use laundry_service::domain::ports::{Store, SystemClock};
use laundry_service::infrastructure::memory::MemoryStore;
use laundry_service::{build_server, AppServices};
use reqwest::Client;
use serde_json::{json, Value};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind failed")
        .local_addr()
        .expect("addr failed")
        .port()
}

/// Wait until `url` answers at all, retrying every `interval` for up to
/// `timeout` total. Panics if the server never comes up.
async fn wait_for_http(url: &str, timeout: Duration, interval: Duration) {
    let client = Client::builder()
        .timeout(Duration::from_secs(3))
        .build()
        .unwrap();
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if tokio::time::Instant::now() > deadline {
            panic!("server did not become ready within {:?}", timeout);
        }
        if client.get(url).send().await.is_ok() {
            return;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Start a server with a zero-length verification window so providers
/// activate on their first login.
async fn spawn_app() -> String {
    let store: Arc<dyn Store> = Arc::new(MemoryStore::with_default_catalog());
    let services = AppServices::new(store, Arc::new(SystemClock), chrono::Duration::zero());
    let port = free_port();
    let server = build_server(services, "127.0.0.1", port).expect("Failed to bind the service");
    tokio::spawn(server);

    let app_url = format!("http://127.0.0.1:{}", port);
    wait_for_http(
        &format!("{}/services", app_url),
        Duration::from_secs(10),
        Duration::from_millis(100),
    )
    .await;
    app_url
}

async fn post(http: &Client, url: String, body: Value) -> (u16, Value) {
    let resp = http.post(url).json(&body).send().await.expect("POST failed");
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn get(http: &Client, url: String) -> (u16, Value) {
    let resp = http.get(url).send().await.expect("GET failed");
    let status = resp.status().as_u16();
    (status, resp.json().await.unwrap_or(Value::Null))
}

async fn set_status(http: &Client, app_url: &str, order_id: &str, status: &str) -> u16 {
    http.put(format!("{}/orders/{}/status", app_url, order_id))
        .json(&json!({ "status": status }))
        .send()
        .await
        .expect("PUT status failed")
        .status()
        .as_u16()
}

#[tokio::test]
async fn test_order_lifecycle_over_http() {
    let app_url = spawn_app().await;
    let http = Client::new();

    // ── 1. Accounts ─────────────────────────────────────────────────────────
    let (status, customer) = post(
        &http,
        format!("{}/customers", app_url),
        json!({ "name": "Ana", "email": "ana@example.com", "credential": "pw", "phone": "3001234567" }),
    )
    .await;
    assert_eq!(status, 201);
    let customer_id = customer["id"].as_str().unwrap().to_string();

    let (status, laundry) = post(
        &http,
        format!("{}/providers", app_url),
        json!({
            "name": "Lava Express",
            "email": "lava@example.com",
            "credential": "pw",
            "city": "Bogotá",
            "address": "Carrera 7 # 45-10",
            "capacity": 1,
            "offered_services": [2],
            "is_24h": true
        }),
    )
    .await;
    assert_eq!(status, 201);
    assert_eq!(laundry["activation_state"], "pending");
    let provider_id = laundry["id"].as_str().unwrap().to_string();

    let order = json!({
        "customer_id": customer_id,
        "provider_id": provider_id,
        "service_id": 2,
        "weight_kg": "5",
        "extra_ids": [1],
        "delivery_method": "pickup",
        "coupon_code": "GIRO20",
        "pickup": { "address": "Calle 80 # 10-20", "time_window": "08:00-10:00" }
    });

    // ── 2. A provider that never logged in is still pending ─────────────────
    let (status, _) = post(&http, format!("{}/orders", app_url), order.clone()).await;
    assert_eq!(status, 409);

    let (status, login) = post(
        &http,
        format!("{}/auth/login", app_url),
        json!({ "identifier": "lava@example.com", "credential": "pw", "role": "laundry" }),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(login["account_id"], provider_id.as_str());

    // ── 3. Discovery and placement ──────────────────────────────────────────
    let (status, available) = get(
        &http,
        format!("{}/providers/available?city=bogot%C3%A1&service_id=2", app_url),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(available[0]["id"], provider_id.as_str());

    let (status, created) = post(&http, format!("{}/orders", app_url), order.clone()).await;
    assert_eq!(status, 201);
    assert_eq!(created["total"], "45.50");
    let order_id = created["id"].as_str().unwrap().to_string();

    let (status, refused) = post(&http, format!("{}/orders", app_url), order.clone()).await;
    assert_eq!(status, 409);
    assert_eq!(refused["error"], "Provider is at capacity");

    // ── 4. Fulfillment frees the slot once ready for dispatch ───────────────
    assert_eq!(set_status(&http, &app_url, &order_id, "washing").await, 200);
    assert_eq!(set_status(&http, &app_url, &order_id, "received").await, 409);
    assert_eq!(set_status(&http, &app_url, &order_id, "ready_for_dispatch").await, 200);

    let (_, available) = get(
        &http,
        format!("{}/providers/available?city=Bogotá&service_id=2", app_url),
    )
    .await;
    assert_eq!(available.as_array().unwrap().len(), 1);

    assert_eq!(set_status(&http, &app_url, &order_id, "delivered").await, 200);
    let paid: Value = http
        .patch(format!("{}/orders/{}/payment", app_url, order_id))
        .json(&json!({ "payment_status": "completed", "payment_method": "cash" }))
        .send()
        .await
        .expect("PATCH payment failed")
        .json()
        .await
        .expect("payment response");
    assert_eq!(paid["payment_status"], "completed");

    // ── 5. Read models ──────────────────────────────────────────────────────
    let (status, listing) = get(
        &http,
        format!("{}/orders?role=customer&account_id={}", app_url, customer_id),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(listing["active"].as_array().unwrap().len(), 0);
    assert_eq!(listing["historical"][0]["counterparty"]["name"], "Lava Express");

    let (status, board) = get(
        &http,
        format!("{}/providers/{}/dashboard", app_url, provider_id),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(board["pending"], 0);
    assert_eq!(board["awaiting_cash_collection"], 0);

    let (status, _) = get(&http, format!("{}/api-docs/openapi.json", app_url)).await;
    assert_eq!(status, 200);
}
