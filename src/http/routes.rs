//! HTTP route definitions

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::error;
use uuid::Uuid;

use crate::app::AppState;
use crate::http::middleware::{require_admin, require_auth};
use crate::http::{admin, callback, feedback, portfolios, user};
use crate::store::supabase::SupabaseError;
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/auth/callback", get(callback::oauth_callback_handler))
        .route("/auth/signout", post(callback::signout_handler));

    // Admin routes (auth + admin flag + completed MFA)
    let admin_routes = Router::new()
        .route(
            "/api/admin/refresh-rankings",
            post(admin::refresh_rankings_handler),
        )
        .route(
            "/api/admin/portfolios/pending",
            get(admin::pending_portfolios_handler),
        )
        .route(
            "/api/admin/portfolios/:id/review",
            post(admin::review_portfolio_handler),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/portfolios", post(portfolios::create_portfolio_handler))
        .route(
            "/api/portfolios/rankings",
            post(portfolios::rankings_handler),
        )
        .route(
            "/api/portfolios/draft/cleanup",
            delete(portfolios::cleanup_drafts_handler),
        )
        .route("/api/portfolios/:id", get(portfolios::get_portfolio_handler))
        .route(
            "/api/portfolios/:id/publish",
            post(portfolios::publish_portfolio_handler),
        )
        .route(
            "/api/portfolios/:id/feedback",
            get(feedback::feedback_summary_handler).post(feedback::submit_feedback_handler),
        )
        .route("/api/feedback/chips", get(feedback::chips_handler))
        .route("/api/user/feedback-count", get(user::feedback_count_handler))
        .route("/api/user/mfa-status", get(user::mfa_status_handler))
        .merge(admin_routes)
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests: {0}")]
    TooManyRequests(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Map a backend failure to a 500, logging who and what it concerned.
pub(crate) fn backend_error(
    action: &'static str,
    user_id: Uuid,
    portfolio_id: Option<Uuid>,
) -> impl FnOnce(SupabaseError) -> AppError {
    move |e| {
        error!(
            user_id = %user_id,
            portfolio_id = ?portfolio_id,
            error = %e,
            "{} failed",
            action
        );
        AppError::Internal(e.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg.clone()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{body_json, spawn_backend, test_state};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_is_public() {
        let backend = spawn_backend(Router::new()).await;
        let app = build_router(test_state(&backend));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn every_api_route_requires_a_token() {
        let backend = spawn_backend(Router::new()).await;
        let id = uuid::Uuid::new_v4();
        let routes = [
            (Method::POST, "/api/portfolios".to_string()),
            (Method::POST, "/api/portfolios/rankings".to_string()),
            (Method::DELETE, "/api/portfolios/draft/cleanup".to_string()),
            (Method::GET, format!("/api/portfolios/{}", id)),
            (Method::POST, format!("/api/portfolios/{}/publish", id)),
            (Method::GET, format!("/api/portfolios/{}/feedback", id)),
            (Method::POST, format!("/api/portfolios/{}/feedback", id)),
            (Method::GET, "/api/feedback/chips".to_string()),
            (Method::GET, "/api/user/feedback-count".to_string()),
            (Method::GET, "/api/user/mfa-status".to_string()),
            (Method::POST, "/api/admin/refresh-rankings".to_string()),
            (Method::GET, "/api/admin/portfolios/pending".to_string()),
            (Method::POST, format!("/api/admin/portfolios/{}/review", id)),
        ];

        for (method, uri) in routes {
            let app = build_router(test_state(&backend));
            let response = app
                .oneshot(
                    Request::builder()
                        .method(method.clone())
                        .uri(&uri)
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(
                response.status(),
                StatusCode::UNAUTHORIZED,
                "{} {} should be 401",
                method,
                uri
            );
            let body = body_json(response).await;
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let backend = spawn_backend(Router::new()).await;
        let app = build_router(test_state(&backend));
        let token = crate::test_support::sign_token(uuid::Uuid::new_v4(), None, "wrong-secret");

        let response = app
            .oneshot(
                Request::get("/api/user/feedback-count")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn backend_failure_becomes_500_with_message() {
        let to_app_error = backend_error("Profile lookup", uuid::Uuid::new_v4(), None);
        let response = to_app_error(SupabaseError::Api {
            status: 503,
            body: "upstream down".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("upstream down"));
    }
}
