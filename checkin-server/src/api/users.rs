//! Current user and profile setup

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::response::{AppendHeaders, IntoResponse};
use axum::routing::{get, put};
use axum::{Json, Router};
use http::header::SET_COOKIE;
use shared::error::AppError;
use shared::models::{MeResponse, ProfileResponse, ProfileUpdate};

use super::{ApiResult, json_body, required};
use crate::auth::CurrentUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/me", get(me))
        .route("/users/me/profile", put(update_profile))
}

/// GET /users/me
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<MeResponse> {
    Ok(Json(state.services.auth.me(user.user_id).await?))
}

/// PUT /users/me/profile - sets name and role, re-issues the session cookie
pub async fn update_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = json_body(payload)?;
    let display_name = required(body.display_name, "displayName")?;
    let role = required(body.role, "role")?;

    let (updated, token) = state
        .services
        .auth
        .update_profile(user.user_id, &display_name, &role)
        .await?;
    let role = updated
        .role
        .ok_or_else(|| AppError::internal("role missing after profile update"))?;

    Ok((
        AppendHeaders([(SET_COOKIE, state.sessions.cookie(&token))]),
        Json(ProfileResponse {
            user_id: updated.id,
            display_name: updated.display_name,
            role,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::TestApp;
    use http::{Method, StatusCode};
    use serde_json::json;
    use shared::models::Role;

    #[tokio::test]
    async fn me_without_group() {
        let app = TestApp::new();
        let user = app.store.add_user("U1", "Taro", None);
        let cookie = app.cookie_for(&user);

        let (status, body) = app.get("/users/me", Some(&cookie)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], user.id);
        assert_eq!(body["role"], serde_json::Value::Null);
        assert_eq!(body["hasGroup"], false);
    }

    #[tokio::test]
    async fn me_for_vanished_user_is_not_found() {
        let app = TestApp::new();
        let ghost = shared::models::User {
            id: 777,
            line_id: "U777".into(),
            display_name: String::new(),
            role: None,
            points: 0,
            created_at: 0,
        };
        let (status, _) = app.get("/users/me", Some(&app.cookie_for(&ghost))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn profile_update_sets_role_and_cookie() {
        let app = TestApp::new();
        let user = app.store.add_user("U1", "", None);
        let cookie = app.cookie_for(&user);

        let (status, headers, body) = app
            .send(
                Method::PUT,
                "/users/me/profile",
                Some(&cookie),
                json!({"displayName": "Grandma", "role": "grandparent"}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"userId": user.id, "displayName": "Grandma", "role": "grandparent"})
        );
        assert!(headers.contains_key(http::header::SET_COOKIE));
        assert_eq!(app.store.user(user.id).unwrap().role, Some(Role::Grandparent));
    }

    #[tokio::test]
    async fn profile_update_validation() {
        let app = TestApp::new();
        let user = app.store.add_user("U1", "", None);
        let cookie = app.cookie_for(&user);

        let (status, _, body) = app
            .send(Method::PUT, "/users/me/profile", Some(&cookie), json!({"role": "family"}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "displayName");

        let (status, _, body) = app
            .send(
                Method::PUT,
                "/users/me/profile",
                Some(&cookie),
                json!({"displayName": "X", "role": "boss"}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["details"]["field"], "role");
    }
}
