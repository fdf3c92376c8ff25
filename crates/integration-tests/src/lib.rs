//! Integration test harness for the Mustafo storefront.
//!
//! [`TestContext`] builds the real router over a temporary data directory and
//! points the Telegram client at [`FakeTelegram`], an in-process Bot API that
//! records every `sendMessage` call.
//!
//! ```rust,ignore
//! let ctx = TestContext::new().await;
//! let (status, body) = ctx.get("/cart").await;
//! assert_eq!(status, StatusCode::OK);
//! ```

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path as UrlPath, State},
    http::{Request, StatusCode, header},
    routing::post,
};
use mustafo_core::Price;
use mustafo_storefront::config::{StorefrontConfig, TelegramConfig};
use mustafo_storefront::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::sync::Semaphore;
use tower::ServiceExt;

/// Bot token used by every test context.
pub const TEST_BOT_TOKEN: &str = "7000000001:AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ";

/// Chat that receives test orders.
pub const TEST_CHAT_ID: &str = "5663095517";

/// How the fake Bot API answers `sendMessage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `{"ok": true}`
    Ok,
    /// HTTP 400 with `{"ok": false}`
    Reject,
    /// Wait for [`FakeTelegram::release`], then answer `Ok`.
    Hold,
}

/// A `sendMessage` call received by the fake Bot API.
#[derive(Debug, Clone)]
pub struct SentMessage {
    /// Request path, including the `bot<token>` segment.
    pub path: String,
    pub body: Value,
}

impl SentMessage {
    #[must_use]
    pub fn text(&self) -> &str {
        self.body["text"].as_str().unwrap_or_default()
    }
}

#[derive(Debug)]
struct FakeState {
    reply: Mutex<Reply>,
    sent: Mutex<Vec<SentMessage>>,
    gate: Semaphore,
}

/// In-process stand-in for the Telegram Bot API.
#[derive(Debug, Clone)]
pub struct FakeTelegram {
    addr: SocketAddr,
    state: Arc<FakeState>,
}

impl FakeTelegram {
    /// Bind on an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState {
            reply: Mutex::new(Reply::Ok),
            sent: Mutex::new(Vec::new()),
            gate: Semaphore::new(0),
        });

        let app = Router::new()
            .route("/{token}/{method}", post(fake_method))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    /// Base URL to use as `TELEGRAM_API_BASE`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn set_reply(&self, reply: Reply) {
        *self.state.reply.lock().unwrap() = reply;
    }

    /// Let one held request answer.
    pub fn release(&self) {
        self.state.gate.add_permits(1);
    }

    /// Every message received so far.
    #[must_use]
    pub fn sent(&self) -> Vec<SentMessage> {
        self.state.sent.lock().unwrap().clone()
    }

    /// Wait until at least `count` messages have arrived.
    pub async fn wait_for(&self, count: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.state.sent.lock().unwrap().len() < count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }
}

async fn fake_method(
    State(state): State<Arc<FakeState>>,
    UrlPath((token, method)): UrlPath<(String, String)>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let reply = *state.reply.lock().unwrap();
    state.sent.lock().unwrap().push(SentMessage {
        path: format!("/{token}/{method}"),
        body,
    });

    match reply {
        Reply::Ok => (StatusCode::OK, Json(json!({ "ok": true, "result": {} }))),
        Reply::Reject => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })),
        ),
        Reply::Hold => {
            state.gate.acquire().await.unwrap().forget();
            (StatusCode::OK, Json(json!({ "ok": true, "result": {} })))
        }
    }
}

/// A storefront wired to a temporary data directory and a fake Bot API.
pub struct TestContext {
    pub state: AppState,
    pub telegram: FakeTelegram,
    data: TempDir,
}

impl TestContext {
    /// Fresh context with an empty cart and a shipping fee of $10.
    pub async fn new() -> Self {
        let data = tempfile::tempdir().unwrap();
        let telegram = FakeTelegram::start().await;
        let state = AppState::new(config(data.path(), &telegram.url()));
        Self {
            state,
            telegram,
            data,
        }
    }

    /// Directory backing the cart slot.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        self.data.path()
    }

    /// Path of the persisted cart file.
    #[must_use]
    pub fn cart_file(&self) -> PathBuf {
        self.data.path().join("carts.json")
    }

    /// Build a second app over the same data directory, as after a restart.
    #[must_use]
    pub fn reload(&self) -> AppState {
        AppState::new(config(self.data.path(), &self.telegram.url()))
    }

    /// Build an app whose data directory is `data_dir`.
    #[must_use]
    pub fn with_data_dir(&self, data_dir: &Path) -> AppState {
        AppState::new(config(data_dir, &self.telegram.url()))
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        send(&self.state, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(&self.state, request).await
    }

    pub async fn post_form(&self, uri: &str, form: &str) -> (StatusCode, Value) {
        let request = Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        send(&self.state, request).await
    }

    pub async fn checkout(&self) -> (StatusCode, Value) {
        send(
            &self.state,
            Request::post("/cart/checkout").body(Body::empty()).unwrap(),
        )
        .await
    }
}

/// Run one request through the full router and decode the JSON reply.
///
/// Non-JSON bodies are returned as a JSON string.
pub async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
    let response = mustafo_storefront::routes::app(state.clone())
        .oneshot(request)
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    (status, body)
}

/// A product as the catalogue sends it to `POST /cart/add`.
#[must_use]
pub fn product(id: i32, title: &str, price: f64) -> Value {
    json!({
        "id": id,
        "title": title,
        "description": format!("{title} description"),
        "image": format!("https://fakestoreapi.com/img/{id}.jpg"),
        "price": price,
        "category": "men's clothing",
        "rating": { "rate": 3.9, "count": 120 }
    })
}

/// Storefront configuration for tests: $10 shipping, test bot credentials.
#[must_use]
pub fn config(data_dir: &Path, api_base: &str) -> StorefrontConfig {
    StorefrontConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        data_dir: data_dir.to_path_buf(),
        shipping_fee: Price::from_cents(1000),
        telegram: TelegramConfig {
            api_base: api_base.to_string(),
            bot_token: SecretString::from(TEST_BOT_TOKEN),
            chat_id: TEST_CHAT_ID.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}
