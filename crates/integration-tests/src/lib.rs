//! Integration tests for Bazaar.
//!
//! These tests talk to a running server and are `#[ignore]`d by default.
//!
//! # Running Tests
//!
//! ```bash
//! cargo run -p bazaar-cli -- migrate
//! APP_ENV=development cargo run -p bazaar-api &
//! cargo test -p bazaar-integration-tests -- --ignored
//! ```
//!
//! # Environment
//!
//! - `BAZAAR_TEST_URL` - Base URL of the server (default: `http://127.0.0.1:5000`)
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD` - Bootstrap administrator credentials
//! - `API_DATABASE_URL` (or `DATABASE_URL`) - Same database as the server, for
//!   fixtures the HTTP API cannot create

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, Method, StatusCode};
use serde_json::{Value, json};
use sqlx::PgPool;

/// Shared HTTP client and helpers for one test.
pub struct TestContext {
    pub client: Client,
    pub base_url: String,
    /// Sent as `X-Forwarded-For` so each test gets its own rate-limit bucket.
    pub client_ip: String,
}

/// Status code and decoded JSON envelope of one call.
#[derive(Debug)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Value,
}

impl Reply {
    /// The `data` member of the envelope.
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    /// Integer `data.id`, for resources the test just created.
    pub fn id(&self) -> i64 {
        self.data()["id"]
            .as_i64()
            .unwrap_or_else(|| panic!("response has no id: {}", self.body))
    }
}

impl TestContext {
    pub fn new() -> Self {
        let base_url = std::env::var("BAZAAR_TEST_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:5000".to_string())
            .trim_end_matches('/')
            .to_string();
        let bytes = uuid::Uuid::new_v4().into_bytes();
        let client_ip = format!("10.{}.{}.{}", bytes[0], bytes[1], bytes[2]);
        Self {
            client: Client::new(),
            base_url,
            client_ip,
        }
    }

    /// Send a request and decode the envelope.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("x-forwarded-for", &self.client_ip);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await.expect("server unreachable");
        let status = response.status();
        let body = response.json().await.unwrap_or(Value::Null);
        Reply { status, body }
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Reply {
        self.call(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> Reply {
        self.call(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> Reply {
        self.call(Method::PUT, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Reply {
        self.call(Method::DELETE, path, token, None).await
    }

    /// Register a fresh customer and return `(email, token)`.
    pub async fn register_customer(&self) -> (String, String) {
        let email = unique_email("customer");
        let reply = self
            .post(
                "/auth/register",
                None,
                json!({ "name": "Test Customer", "email": email, "password": "secret123" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let token = reply.data()["token"].as_str().unwrap().to_string();
        (email, token)
    }

    /// Bootstrap the administrator (idempotent) and log in as them.
    pub async fn admin_token(&self) -> String {
        let email =
            std::env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@example.com".to_string());
        let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

        let reply = self.post("/auth/create-admin", None, json!({})).await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);

        let reply = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": password }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.data()["token"].as_str().unwrap().to_string()
    }

    /// Connect to the server's database.
    pub async fn pool(&self) -> PgPool {
        let url = std::env::var("API_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .expect("API_DATABASE_URL or DATABASE_URL must be set");
        PgPool::connect(&url).await.expect("database unreachable")
    }

    /// Deactivate an account; there is no HTTP route for this.
    pub async fn deactivate_user(&self, email: &str) {
        let result = sqlx::query("UPDATE users SET is_active = FALSE WHERE email = $1")
            .bind(email)
            .execute(&self.pool().await)
            .await
            .expect("failed to deactivate user");
        assert_eq!(result.rows_affected(), 1, "no user with email {email}");
    }

    /// Create an active category with a unique name.
    pub async fn create_category(&self, admin: &str) -> i64 {
        let reply = self
            .post(
                "/categories",
                Some(admin),
                json!({ "name": unique_name("Category") }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.id()
    }

    /// Create a product in `category` with the given price and stock.
    pub async fn create_product(&self, admin: &str, category: i64, price: &str, stock: i32) -> i64 {
        let reply = self
            .post(
                "/products",
                Some(admin),
                json!({
                    "name": unique_name("Product"),
                    "description": "Integration test product",
                    "price": price,
                    "category": category,
                    "stock": stock,
                }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.id()
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Shipping address accepted by order validation.
pub fn shipping_address() -> Value {
    json!({
        "name": "Guest Buyer",
        "phone": "0912345678",
        "address": "12 Market Street",
        "city": "Hanoi",
        "email": "guest@example.com"
    })
}

pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@example.com", uuid::Uuid::new_v4().simple())
}

pub fn unique_name(prefix: &str) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix} {}", &id[..12])
}
