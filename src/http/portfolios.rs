//! Portfolio upload, gallery and draft cleanup endpoints

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::app::AppState;
use crate::http::extract::{ApiJson, ApiPath, ApiQuery};
use crate::http::middleware::AuthenticatedUser;
use crate::http::routes::{backend_error, AppError};
use crate::store::portfolios::{normalize_tools, Portfolio, PortfolioStatus, PortfolioSubmission};
use crate::store::rankings::{GalleryQuery, RankedPortfolio, TimeWindow};

/// Fetch a portfolio the caller may see, or 404
pub(crate) async fn load_visible_portfolio(
    state: &AppState,
    id: Uuid,
    viewer: Uuid,
) -> Result<Portfolio, AppError> {
    state
        .portfolio_store
        .get(id)
        .await
        .map_err(backend_error("Portfolio lookup", viewer, Some(id)))?
        .filter(|p| p.visible_to(viewer))
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))
}

// ============================================================================
// Create / read / publish
// ============================================================================

pub async fn create_portfolio_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiJson(req): ApiJson<PortfolioSubmission>,
) -> Result<(StatusCode, Json<Portfolio>), AppError> {
    let row = req
        .into_new_portfolio(auth.user_id)
        .map_err(AppError::BadRequest)?;

    let portfolio = state
        .portfolio_store
        .create(&row)
        .await
        .map_err(backend_error("Portfolio insert", auth.user_id, None))?;

    info!(
        user_id = %auth.user_id,
        portfolio_id = %portfolio.id,
        status = ?portfolio.status,
        "Portfolio created"
    );

    Ok((StatusCode::CREATED, Json(portfolio)))
}

pub async fn get_portfolio_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Portfolio>, AppError> {
    load_visible_portfolio(&state, id, auth.user_id).await.map(Json)
}

pub async fn publish_portfolio_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Portfolio>, AppError> {
    let existing = state
        .portfolio_store
        .get(id)
        .await
        .map_err(backend_error("Portfolio lookup", auth.user_id, Some(id)))?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".to_string()))?;

    if existing.user_id != auth.user_id {
        return Err(AppError::Forbidden(
            "Only the owner can publish a portfolio".to_string(),
        ));
    }
    if existing.status != PortfolioStatus::Draft {
        return Err(AppError::BadRequest("Portfolio is already published".to_string()));
    }

    // The row can change between the read and the update
    let published = state
        .portfolio_store
        .publish(id)
        .await
        .map_err(backend_error("Portfolio publish", auth.user_id, Some(id)))?
        .ok_or_else(|| AppError::BadRequest("Portfolio is already published".to_string()))?;

    info!(user_id = %auth.user_id, portfolio_id = %id, "Portfolio submitted for review");
    Ok(Json(published))
}

// ============================================================================
// Ranked gallery
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct RankingsRequest {
    #[serde(default)]
    pub time_window: TimeWindow,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub page: usize,
    #[serde(default)]
    pub page_size: Option<usize>,
}

#[derive(Serialize)]
pub struct RankingsResponse {
    items: Vec<RankedPortfolio>,
    page: usize,
    page_size: usize,
    has_more: bool,
}

pub async fn rankings_handler(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RankingsRequest>,
) -> Result<Json<RankingsResponse>, AppError> {
    let tools = normalize_tools(req.tools).map_err(AppError::BadRequest)?;
    let query = GalleryQuery::new(req.time_window, tools, req.page, req.page_size);

    let page = state.ranking_store.fetch_page(&query).await.map_err(|e| {
        error!(error = %e, time_window = query.time_window.as_str(), "Failed to fetch rankings");
        AppError::Internal(e.to_string())
    })?;

    Ok(Json(RankingsResponse {
        items: page.items,
        page: query.page,
        page_size: query.page_size,
        has_more: page.has_more,
    }))
}

// ============================================================================
// Draft cleanup
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CleanupParams {
    pub portfolio_id: Option<Uuid>,
}

#[derive(Serialize)]
pub struct CleanupResponse {
    deleted: usize,
    ids: Vec<Uuid>,
}

pub async fn cleanup_drafts_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiQuery(params): ApiQuery<CleanupParams>,
) -> Result<Json<CleanupResponse>, AppError> {
    let ids = match params.portfolio_id {
        Some(id) => state.portfolio_store.delete_draft(auth.user_id, id).await,
        None => {
            let cutoff = Utc::now() - Duration::hours(state.config.draft_max_age_hours);
            state
                .portfolio_store
                .delete_stale_drafts(auth.user_id, cutoff)
                .await
        }
    }
    .map_err(|e| {
        error!(user_id = %auth.user_id, error = %e, "Draft cleanup failed");
        AppError::Internal(e.to_string())
    })?;

    if !ids.is_empty() {
        info!(user_id = %auth.user_id, deleted = ids.len(), "Removed draft portfolios");
    }

    Ok(Json(CleanupResponse {
        deleted: ids.len(),
        ids,
    }))
}
