//! Session authentication
//!
//! Handlers take a [`CurrentUser`] argument; extraction validates the session
//! token from the `auth_token` cookie, falling back to `Authorization: Bearer`.

pub mod session;

use axum::extract::FromRequestParts;
use http::request::Parts;
use shared::error::AppError;
use shared::models::Role;

use crate::state::AppState;

pub use session::{SESSION_COOKIE, SessionClaims, SessionError, SessionKeys};

/// Authenticated caller, as recorded in the session token
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user_id: i64,
    pub line_id: String,
    pub role: Option<Role>,
}

impl TryFrom<SessionClaims> for CurrentUser {
    type Error = std::num::ParseIntError;

    fn try_from(claims: SessionClaims) -> Result<Self, Self::Error> {
        Ok(Self {
            user_id: claims.sub.parse()?,
            line_id: claims.line_id,
            role: claims.role,
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn cookie_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(http::header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .find_map(session::token_from_cookie_header)
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let Some(token) = cookie_token(parts).or_else(|| bearer_token(parts)) else {
            tracing::debug!(uri = %parts.uri, "Missing session token");
            return Err(AppError::not_authenticated());
        };

        let claims = state.sessions.validate(token).map_err(|e| {
            tracing::debug!(uri = %parts.uri, error = %e, "Session validation failed");
            match e {
                SessionError::Expired => AppError::token_expired(),
                _ => AppError::invalid_token("Invalid token"),
            }
        })?;

        let user = CurrentUser::try_from(claims)
            .map_err(|e| AppError::invalid_token(format!("Malformed session claims: {e}")))?;

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
