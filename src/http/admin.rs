//! Admin endpoints: ranking refresh and submission review
//!
//! Mounted behind both `require_auth` and `require_admin`.

use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::extract::{ApiJson, ApiPath};
use crate::http::middleware::AuthenticatedUser;
use crate::http::routes::{backend_error, AppError};
use crate::store::portfolios::{ApprovalStatus, Portfolio, PortfolioStatus};

#[derive(Serialize)]
pub struct RefreshResponse {
    success: bool,
    refreshed_at: DateTime<Utc>,
}

pub async fn refresh_rankings_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<RefreshResponse>, AppError> {
    // The slot is taken before the RPC runs, so a failed refresh still
    // starts the cooldown.
    if state.refresh_limiter.check().is_err() {
        return Err(AppError::TooManyRequests(
            "Rankings were refreshed recently, try again shortly".to_string(),
        ));
    }

    state.ranking_store.refresh().await.map_err(|e| {
        error!(user_id = %auth.user_id, error = %e, "Error refreshing rankings");
        AppError::Internal(e.to_string())
    })?;

    info!(user_id = %auth.user_id, "Portfolio rankings refreshed");

    Ok(Json(RefreshResponse {
        success: true,
        refreshed_at: Utc::now(),
    }))
}

pub async fn pending_portfolios_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<Portfolio>>, AppError> {
    let pending = state
        .portfolio_store
        .list_pending()
        .await
        .map_err(backend_error("Pending review listing", auth.user_id, None))?;
    Ok(Json(pending))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl From<ReviewDecision> for ApprovalStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approve => ApprovalStatus::Approved,
            ReviewDecision::Reject => ApprovalStatus::Rejected,
        }
    }
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    decision: ReviewDecision,
}

pub async fn review_portfolio_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ReviewRequest>,
) -> Result<Json<Portfolio>, AppError> {
    let existing = state
        .portfolio_store
        .get(id)
        .await
        .map_err(backend_error("Portfolio lookup", auth.user_id, Some(id)))?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    if existing.status != PortfolioStatus::Published {
        return Err(AppError::BadRequest("Drafts cannot be reviewed".to_string()));
    }

    let approval: ApprovalStatus = req.decision.into();
    let updated = state
        .portfolio_store
        .set_approval(id, approval)
        .await
        .map_err(backend_error("Portfolio review", auth.user_id, Some(id)))?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    info!(
        admin_id = %auth.user_id,
        portfolio_id = %id,
        decision = approval.as_str(),
        "Portfolio reviewed"
    );

    Ok(Json(updated))
}
