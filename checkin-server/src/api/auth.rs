//! LINE login
//!
//! `POST /auth/line` accepts `{code}` or `{idToken}` and answers with the
//! session cookie plus `{isNewUser}`.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::post;
use axum::{Json, Router};
use http::header::SET_COOKIE;
use shared::error::AppError;
use shared::models::{LineAuthRequest, LineAuthResponse};

use super::json_body;
use crate::line::LoginCredential;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/auth/line", post(line_login))
}

fn credential(body: LineAuthRequest) -> Result<LoginCredential, AppError> {
    let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    if let Some(id_token) = non_empty(body.id_token) {
        return Ok(LoginCredential::IdToken(id_token));
    }
    non_empty(body.code)
        .map(LoginCredential::Code)
        .ok_or_else(|| AppError::required("code"))
}

pub async fn line_login(
    State(state): State<AppState>,
    payload: Result<Json<LineAuthRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let credential = credential(json_body(payload)?)?;
    let outcome = state.services.auth.login(credential).await?;

    tracing::info!(user_id = outcome.user.id, is_new_user = outcome.is_new_user, "LINE login");
    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.cookie(&outcome.token))]),
        Json(LineAuthResponse {
            is_new_user: outcome.is_new_user,
        }),
    ))
}
