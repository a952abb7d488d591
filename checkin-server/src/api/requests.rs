//! Point-gated requests

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{PendingRequests, RequestCreate, RequestCreated};

use super::{ApiResult, json_body, required};
use crate::auth::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/requests", post(create))
        .route("/requests/pending", get(pending))
}

/// POST /requests
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<RequestCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<RequestCreated>), AppError> {
    let body = json_body(payload)?;
    let request_type = required(body.request_type, "requestType")?;
    let content = required(body.content, "content")?;
    let created = state
        .services
        .requests
        .send_request(user.user_id, &request_type, &content)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /requests/pending
pub async fn pending(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<PendingRequests> {
    Ok(Json(state.services.requests.pending_requests(user.user_id).await?))
}
