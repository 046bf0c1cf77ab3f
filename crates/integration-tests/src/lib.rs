//! Integration test harness for the Atelier storefront.
//!
//! [`TestApp::spawn`] serves the real router on an ephemeral port with the
//! in-memory order store, a memory session store and a recording mail
//! transport. Tests drive it over HTTP with a cookie-keeping `reqwest`
//! client, so the session cart behaves as it does in a browser.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p atelier-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use atelier_storefront::config::{OrderSettings, StorefrontConfig};
use atelier_storefront::db::InMemoryOrderStore;
use atelier_storefront::middleware::create_session_layer;
use atelier_storefront::routes;
use atelier_storefront::services::{EmailError, Notifier, OutgoingEmail};
use atelier_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower_sessions::MemoryStore;

/// Admin token used by every test app.
pub const ADMIN_TOKEN: &str = "test-admin-token-9f8e7d6c5b4a39281706f5e4d3c2b1a0";

/// Recipient of new-order alerts in test apps.
pub const ADMIN_EMAIL: &str = "studio@atelier.test";

/// Mail transport that keeps every message in memory.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingNotifier {
    /// Messages delivered so far.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        self.sent.lock().await.push(email);
        Ok(())
    }
}

/// Mail transport whose relay always refuses.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl Notifier for FailingNotifier {
    async fn send(&self, _email: OutgoingEmail) -> Result<(), EmailError> {
        Err(EmailError::Delivery("relay refused connection".to_owned()))
    }
}

/// A running storefront plus handles on its collaborators.
pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub store: Arc<InMemoryOrderStore>,
    pub outbox: Arc<RecordingNotifier>,
}

impl TestApp {
    /// Serve the app with a recording mail transport.
    pub async fn spawn() -> Self {
        let outbox = Arc::new(RecordingNotifier::default());
        Self::spawn_with(outbox.clone(), outbox).await
    }

    /// Serve the app with a mail transport that always fails.
    pub async fn spawn_with_failing_email() -> Self {
        Self::spawn_with(
            Arc::new(FailingNotifier),
            Arc::new(RecordingNotifier::default()),
        )
        .await
    }

    async fn spawn_with(notifier: Arc<dyn Notifier>, outbox: Arc<RecordingNotifier>) -> Self {
        let store = Arc::new(InMemoryOrderStore::new());
        let config = test_config();
        let sessions = create_session_layer(MemoryStore::default(), &config.base_url);
        let state = AppState::new(config, store.clone(), notifier);
        let app = routes::app(state, sessions);

        let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .expect("bind ephemeral port");
        let address = format!(
            "http://{}",
            listener.local_addr().expect("listener address")
        );
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("test server");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("http client");

        Self {
            address,
            client,
            store,
            outbox,
        }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.address)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn patch_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("request failed")
    }

    pub async fn admin_get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(ADMIN_TOKEN)
            .send()
            .await
            .expect("request failed")
    }

    pub async fn admin_patch(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .patch(self.url(path))
            .bearer_auth(ADMIN_TOKEN)
            .json(body)
            .send()
            .await
            .expect("request failed")
    }

    /// Place an order from [`order_payload`] and return the created order id.
    pub async fn create_order(&self) -> String {
        let response = self.post_json("/orders", &order_payload()).await;
        assert_eq!(response.status(), 201);
        let body: Value = response.json().await.expect("json body");
        body["orderId"]
            .as_str()
            .expect("orderId in response")
            .to_owned()
    }

    /// Wait until at least `count` emails have been recorded.
    pub async fn wait_for_emails(&self, count: usize) -> Vec<OutgoingEmail> {
        for _ in 0..100 {
            let sent = self.outbox.sent().await;
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.outbox.sent().await
    }
}

fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("postgres://unused/test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://127.0.0.1".to_owned(),
        admin_api_token: SecretString::from(ADMIN_TOKEN),
        orders: OrderSettings {
            notification_email: Some(ADMIN_EMAIL.to_owned()),
            ..OrderSettings::default()
        },
        email: None,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Customer block accepted by checkout and order creation.
#[must_use]
pub fn customer() -> Value {
    json!({
        "name": "Yuki Tanaka",
        "email": "yuki@example.com",
        "phone": "090-1234-5678",
        "address": {
            "street": "1-2-3 Jingumae",
            "city": "Tokyo",
            "postalCode": "150-0001"
        }
    })
}

/// A complete, valid `POST /orders` body: two prints, subtotal 2500, shipping 800.
#[must_use]
pub fn order_payload() -> Value {
    json!({
        "customer": customer(),
        "items": [
            {"productId": "p1", "title": "Morning Tide", "price": 1000, "quantity": 2},
            {"productId": "p2", "title": "Harbour Study", "price": 500, "quantity": 1}
        ],
        "subtotal": 2500,
        "shipping": 800,
        "notes": "Please wrap as a gift"
    })
}
