//! Per-user endpoints: feedback count and MFA status

use axum::{
    extract::{Extension, State},
    response::Json,
};
use serde::Serialize;

use crate::app::AppState;
use crate::http::middleware::AuthenticatedUser;
use crate::http::routes::{backend_error, AppError};
use crate::store::auth::AssuranceLevel;

#[derive(Serialize)]
pub struct FeedbackCountResponse {
    count: i64,
}

pub async fn feedback_count_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<FeedbackCountResponse>, AppError> {
    let count = state
        .feedback_store
        .feedback_count(auth.user_id)
        .await
        .map_err(backend_error("Feedback count lookup", auth.user_id, None))?;
    Ok(Json(FeedbackCountResponse { count }))
}

#[derive(Serialize)]
pub struct MfaStatusResponse {
    current_level: AssuranceLevel,
    next_level: AssuranceLevel,
    verification_required: bool,
}

pub async fn mfa_status_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<MfaStatusResponse>, AppError> {
    let levels = state
        .mfa
        .assurance_levels(&auth.access_token, auth.claims.aal.as_deref())
        .await
        .map_err(backend_error("MFA status lookup", auth.user_id, None))?;

    Ok(Json(MfaStatusResponse {
        current_level: levels.current_level,
        next_level: levels.next_level,
        verification_required: levels.verification_required(),
    }))
}
