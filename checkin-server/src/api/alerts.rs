//! Emergency alert

use axum::Router;
use axum::extract::State;
use axum::routing::post;
use http::StatusCode;
use shared::error::AppError;

use crate::auth::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/alerts/emergency", post(emergency))
}

/// POST /alerts/emergency - grandparents only, 204 on success
pub async fn emergency(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AppError> {
    state.services.alerts.emergency(user.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
