use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::HeaderMap;
use sea_orm::{DatabaseConnection, EntityTrait};
use tokio::net::TcpListener;

use crate::auth::api_key::API_KEY_HEADER;
use crate::config::{Config, SecurityConfig};
use crate::mailer::MemoryMailer;
use crate::models::product::{self, Category, Entity as Product};
use crate::services::{auth, catalog};

pub const TEST_API_KEY: &str = "test-api-key";

/// A test application for integration testing.
///
/// Spins up a Slice server on an ephemeral port with an in-memory SQLite
/// database and a [`MemoryMailer`].
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_signup() {
///     let app = TestApp::new().await;
///     let res = app.client.post(&app.url("/api/auth/signup"), r#"{"email":"a@b.com","username":"bob","password":"secret123"}"#).await;
///     assert_eq!(res.status, 201);
/// }
/// ```
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: TestClient,
    pub db: DatabaseConnection,
    pub config: Config,
    pub mailer: MemoryMailer,
    db_file: Option<PathBuf>,
}

impl TestApp {
    /// Test config: in-memory database, API key gate on, new accounts
    /// auto-verified.
    pub fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: "test-secret-key-for-testing".to_string(),
            jwt_expiry_hours: 24,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            environment: "test".to_string(),
            api_key: Some(TEST_API_KEY.to_string()),
            frontend_url: "http://localhost:3000".to_string(),
            mail_api_url: None,
            mail_from: "noreply@slicechill.com".to_string(),
            security: SecurityConfig::default(),
        }
    }

    pub async fn new() -> Self {
        Self::with_config(Self::test_config()).await
    }

    /// Like [`TestApp::new`] but accounts must verify their email first.
    pub async fn new_requiring_verification() -> Self {
        let mut config = Self::test_config();
        config.security.require_email_verification = true;
        Self::with_config(config).await
    }

    /// Like [`TestApp::new`] but backed by a fresh SQLite file with a full
    /// connection pool, so requests really run side by side. The file is
    /// removed when the app is dropped.
    pub async fn with_file_database() -> Self {
        let path = std::env::temp_dir().join(format!(
            "slice-test-{}.db",
            hex::encode(rand::random::<[u8; 8]>())
        ));
        let mut config = Self::test_config();
        config.database_url = format!("sqlite://{}?mode=rwc", path.display());

        let mut app = Self::with_config(config).await;
        app.db_file = Some(path);
        app
    }

    /// Create a new test app with a custom config.
    pub async fn with_config(config: Config) -> Self {
        let mailer = MemoryMailer::new();
        let app = crate::App::with_config(config)
            .await
            .expect("Failed to create test app")
            .with_mailer(Arc::new(mailer.clone()));

        let router = app.router();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let client = TestClient::new(addr, app.config.api_key.clone());

        TestApp {
            addr,
            client,
            db: app.db,
            config: app.config,
            mailer,
            db_file: None,
        }
    }

    /// Get the full URL for a path on the test server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Sign up a user and return the public user JSON.
    pub async fn create_user(&self, email: &str, username: &str, password: &str) -> serde_json::Value {
        let body = serde_json::json!({
            "email": email,
            "username": username,
            "password": password,
        });

        let res = self
            .client
            .post(&self.url("/api/auth/signup"), &body.to_string())
            .await;

        assert_eq!(res.status, 201, "Signup failed: {}", res.body);
        res.data()
    }

    /// Log in and return the session token.
    pub async fn login(&self, email: &str, password: &str) -> String {
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let res = self
            .client
            .post(&self.url("/api/auth/login"), &body.to_string())
            .await;

        assert_eq!(res.status, 200, "Login failed: {}", res.body);
        res.data()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    /// Sign up and log in; returns `(token, user_id)`.
    pub async fn signup_and_login(&self, email: &str, username: &str) -> (String, i64) {
        let user = self.create_user(email, username, "password123").await;
        let token = self.login(email, "password123").await;
        (token, user["id"].as_i64().expect("user id"))
    }

    /// Grant the admin role. Log in again afterwards to get an admin token.
    pub async fn make_admin(&self, email: &str) {
        auth::promote_to_admin(&self.db, email)
            .await
            .expect("Failed to promote user");
    }

    /// Insert a product directly.
    pub async fn create_product(
        &self,
        name: &str,
        category: Category,
        price_cents: i64,
        quantity_available: i32,
    ) -> product::Model {
        catalog::create_product(
            &self.db,
            catalog::NewProduct {
                name: name.to_string(),
                description: format!("{name} for tests"),
                category,
                price_cents,
                image_url: None,
                quantity_available,
            },
        )
        .await
        .expect("Failed to create product")
    }

    /// Current stock of a product.
    pub async fn stock_of(&self, product_id: i32) -> i32 {
        Product::find_by_id(product_id)
            .one(&self.db)
            .await
            .expect("Failed to load product")
            .expect("product exists")
            .quantity_available
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(path) = self.db_file.take() {
            for suffix in ["", "-wal", "-shm", "-journal"] {
                let mut file = path.clone().into_os_string();
                file.push(suffix);
                let _ = std::fs::remove_file(file);
            }
        }
    }
}

/// A simple HTTP test client with helper methods.
///
/// Sends the configured `x-api-key` on every request unless built with
/// [`TestClient::without_api_key`].
#[derive(Clone)]
pub struct TestClient {
    inner: reqwest::Client,
    base_addr: SocketAddr,
    api_key: Option<String>,
}

impl TestClient {
    pub fn new(addr: SocketAddr, api_key: Option<String>) -> Self {
        TestClient {
            inner: reqwest::Client::new(),
            base_addr: addr,
            api_key,
        }
    }

    /// A copy of this client that sends no API key.
    pub fn without_api_key(&self) -> Self {
        TestClient {
            api_key: None,
            ..self.clone()
        }
    }

    /// A copy of this client that sends the given API key.
    pub fn with_api_key(&self, key: &str) -> Self {
        TestClient {
            api_key: Some(key.to_string()),
            ..self.clone()
        }
    }

    async fn send(&self, mut req: reqwest::RequestBuilder) -> TestResponse {
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }
        let res = req.send().await.expect("request failed");
        TestResponse::from_response(res).await
    }

    /// Send a GET request.
    pub async fn get(&self, url: &str) -> TestResponse {
        self.send(self.inner.get(url)).await
    }

    /// Send a GET request with an auth token.
    pub async fn get_with_auth(&self, url: &str, token: &str) -> TestResponse {
        self.send(
            self.inner
                .get(url)
                .header("Authorization", format!("Bearer {}", token)),
        )
        .await
    }

    /// Send a POST request with a JSON body.
    pub async fn post(&self, url: &str, body: &str) -> TestResponse {
        self.send(
            self.inner
                .post(url)
                .header("Content-Type", "application/json")
                .body(body.to_string()),
        )
        .await
    }

    /// Send a POST request with auth token and JSON body.
    pub async fn post_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        self.send(
            self.inner
                .post(url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(body.to_string()),
        )
        .await
    }

    /// Send a PUT request with auth token and JSON body.
    pub async fn put_with_auth(&self, url: &str, token: &str, body: &str) -> TestResponse {
        self.send(
            self.inner
                .put(url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", token))
                .body(body.to_string()),
        )
        .await
    }

    /// Get the base URL.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.base_addr)
    }
}

/// A simplified HTTP response for test assertions.
#[derive(Debug)]
pub struct TestResponse {
    pub status: u16,
    pub body: String,
    pub headers: HeaderMap,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let body = res.text().await.unwrap_or_default();
        TestResponse {
            status,
            body,
            headers,
        }
    }

    /// Parse the body as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("Failed to parse response as JSON")
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.json()["success"].as_bool().unwrap_or(false)
    }

    /// Get the data field from the response.
    pub fn data(&self) -> serde_json::Value {
        self.json()["data"].clone()
    }

    /// Get the error field from the response.
    pub fn error(&self) -> serde_json::Value {
        self.json()["error"].clone()
    }

    /// Get the message field from the response.
    pub fn message(&self) -> String {
        self.json()["message"].as_str().unwrap_or_default().to_string()
    }
}
