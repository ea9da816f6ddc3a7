//! Feedback chips and comments on portfolios

use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use tracing::info;
use uuid::Uuid;

use crate::app::AppState;
use crate::http::extract::{ApiJson, ApiPath};
use crate::http::middleware::AuthenticatedUser;
use crate::http::portfolios::load_visible_portfolio;
use crate::http::routes::{backend_error, AppError};
use crate::store::feedback::{
    FeedbackChip, FeedbackSubmission, FeedbackSummary, NewFeedback, PortfolioFeedback,
};

pub async fn chips_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<Vec<FeedbackChip>>, AppError> {
    let chips = state
        .feedback_store
        .list_chips()
        .await
        .map_err(backend_error("Chip catalogue lookup", auth.user_id, None))?;
    Ok(Json(chips))
}

pub async fn submit_feedback_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiPath(portfolio_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<FeedbackSubmission>,
) -> Result<(StatusCode, Json<PortfolioFeedback>), AppError> {
    let (chip_ids, comment) = req.normalize().map_err(AppError::BadRequest)?;

    let portfolio = load_visible_portfolio(&state, portfolio_id, auth.user_id).await?;
    if portfolio.user_id == auth.user_id {
        return Err(AppError::Forbidden(
            "You cannot leave feedback on your own portfolio".to_string(),
        ));
    }

    let known = state
        .feedback_store
        .get_chips(&chip_ids)
        .await
        .map_err(backend_error("Chip lookup", auth.user_id, Some(portfolio_id)))?;
    if known.len() != chip_ids.len() {
        return Err(AppError::BadRequest("Unknown feedback chip".to_string()));
    }

    let feedback = state
        .feedback_store
        .insert(&NewFeedback {
            id: Uuid::new_v4(),
            portfolio_id,
            author_id: auth.user_id,
            chip_ids,
            comment,
        })
        .await
        .map_err(backend_error("Feedback insert", auth.user_id, Some(portfolio_id)))?;

    info!(
        user_id = %auth.user_id,
        portfolio_id = %portfolio_id,
        chips = feedback.chip_ids.len(),
        "Feedback submitted"
    );

    Ok((StatusCode::CREATED, Json(feedback)))
}

pub async fn feedback_summary_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    ApiPath(portfolio_id): ApiPath<Uuid>,
) -> Result<Json<FeedbackSummary>, AppError> {
    load_visible_portfolio(&state, portfolio_id, auth.user_id).await?;

    let (catalogue, entries) = futures::try_join!(
        state.feedback_store.list_chips(),
        state.feedback_store.list_for_portfolio(portfolio_id),
    )
    .map_err(backend_error("Feedback summary", auth.user_id, Some(portfolio_id)))?;

    Ok(Json(FeedbackSummary::build(portfolio_id, &catalogue, &entries)))
}
