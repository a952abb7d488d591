//! Family groups

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use shared::error::AppError;
use shared::models::{GroupCreate, GroupCreated, GroupJoin, GroupJoined, MemberStats};

use super::{ApiResult, json_body, required};
use crate::auth::CurrentUser;
use crate::services::group::CreateGroupInput;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/groups", post(create))
        .route("/groups/join", post(join))
        .route("/groups/stats/members", get(member_stats))
}

/// POST /groups
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<GroupCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<GroupCreated>), AppError> {
    let body = json_body(payload)?;
    let input = CreateGroupInput {
        group_name: required(body.group_name, "groupName")?,
        password: required(body.password, "password")?,
        alert_frequency_days: body.alert_frequency_days,
    };
    let created = state.services.groups.create_group(user.user_id, input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /groups/join
pub async fn join(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<GroupJoin>, JsonRejection>,
) -> ApiResult<GroupJoined> {
    let body = json_body(payload)?;
    let group_code = required(body.group_id, "groupId")?;
    let password = required(body.password, "password")?;
    let joined = state
        .services
        .groups
        .join_group(user.user_id, &group_code, &password)
        .await?;
    Ok(Json(joined))
}

/// GET /groups/stats/members
pub async fn member_stats(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<MemberStats> {
    Ok(Json(state.services.groups.member_stats(user.user_id).await?))
}
