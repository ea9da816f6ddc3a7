//! Test helpers: a stub Supabase backend and signed tokens.

use std::sync::{Arc, Mutex};

use axum::{
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{any, MethodRouter},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use uuid::Uuid;

use crate::app::AppState;
use crate::config::test_helpers::test_config;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Serve `router` on an ephemeral port, returning its base URL.
pub async fn spawn_backend(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub backend");
    let addr = listener.local_addr().expect("stub backend address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub backend");
    });
    format!("http://{}", addr)
}

pub fn test_state(backend_url: &str) -> AppState {
    AppState::new(test_config(backend_url))
}

/// Respond to any method with a fixed status and JSON body.
///
/// Like PostgREST, an array body is collapsed to its first row when the
/// caller asks for a single object, and an empty array then becomes 406.
pub fn reply(status: StatusCode, body: Value) -> MethodRouter {
    any(move |headers: HeaderMap| {
        let body = body.clone();
        async move { postgrest_response(&headers, status, body) }
    })
}

fn postgrest_response(headers: &HeaderMap, status: StatusCode, body: Value) -> Response {
    let wants_object = headers
        .get(header::ACCEPT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("vnd.pgrst.object"))
        .unwrap_or(false);

    match body {
        Value::Array(rows) if wants_object => match rows.into_iter().next() {
            Some(row) => (status, Json(row)).into_response(),
            None => (StatusCode::NOT_ACCEPTABLE, Json(serde_json::json!({ "code": "PGRST116" })))
                .into_response(),
        },
        body => (status, Json(body)).into_response(),
    }
}

/// PostgREST's answer to a single-object request that matched no rows.
pub fn no_rows() -> MethodRouter {
    reply(
        StatusCode::NOT_ACCEPTABLE,
        serde_json::json!({ "code": "PGRST116", "message": "0 rows" }),
    )
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub uri: Uri,
    pub body: String,
}

impl RecordedRequest {
    /// Decoded query-string value for `key`
    pub fn query(&self, key: &str) -> Option<String> {
        let url = reqwest::Url::parse(&format!("http://stub{}", self.uri)).ok()?;
        url.query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

pub type Recorded = Arc<Mutex<Vec<RecordedRequest>>>;

/// Like [`reply`], but also keeps every request it sees.
pub fn recording(status: StatusCode, body: Value) -> (MethodRouter, Recorded) {
    let recorded: Recorded = Arc::new(Mutex::new(Vec::new()));
    let sink = recorded.clone();
    let router = any(
        move |method: Method, uri: Uri, headers: HeaderMap, req_body: String| {
            let body = body.clone();
            let sink = sink.clone();
            async move {
                sink.lock().expect("recorder lock").push(RecordedRequest {
                    method,
                    uri,
                    body: req_body,
                });
                postgrest_response(&headers, status, body)
            }
        },
    );
    (router, recorded)
}

pub fn sign_claims(claims: &Value, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let message = format!("{}.{}", header, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("hmac key");
    mac.update(message.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}", message, signature)
}

/// A valid one-hour access token for `user_id`
pub fn sign_token(user_id: Uuid, aal: Option<&str>, secret: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let mut claims = serde_json::json!({
        "sub": user_id,
        "aud": "authenticated",
        "role": "authenticated",
        "iat": now,
        "exp": now + 3600,
    });
    if let Some(aal) = aal {
        claims["aal"] = Value::String(aal.to_string());
    }
    sign_claims(&claims, secret)
}

pub fn bearer(user_id: Uuid) -> String {
    format!("Bearer {}", sign_token(user_id, Some("aal1"), TEST_JWT_SECRET))
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// JSON for a portfolio row as PostgREST would return it
pub fn portfolio_json(
    id: Uuid,
    owner: Uuid,
    status: &str,
    approval: &str,
    is_public: bool,
) -> Value {
    serde_json::json!({
        "id": id,
        "user_id": owner,
        "title": "Case study",
        "description": "Checkout redesign",
        "url": "https://example.com/case",
        "thumbnail_url": null,
        "tools": ["Figma"],
        "is_public": is_public,
        "status": status,
        "approval_status": approval,
        "created_at": "2026-01-01T00:00:00Z",
        "updated_at": "2026-01-02T00:00:00Z",
    })
}
