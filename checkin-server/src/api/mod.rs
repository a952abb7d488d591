//! HTTP API
//!
//! | Prefix | Module |
//! |--------|--------|
//! | /health | [`health`] |
//! | /auth | [`auth`] |
//! | /users | [`users`] |
//! | /groups | [`groups`] |
//! | /quizzes | [`quizzes`] |
//! | /alerts | [`alerts`] |
//! | /requests | [`requests`] |

pub mod alerts;
pub mod auth;
pub mod groups;
pub mod health;
pub mod quizzes;
pub mod requests;
pub mod users;

use axum::Json;
use axum::Router;
use axum::extract::rejection::JsonRejection;
use http::{HeaderValue, Method, header};
use shared::error::AppError;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Handler result: JSON body or an `AppError` response
pub type ApiResult<T> = Result<Json<T>, AppError>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Every route, without middleware or state
pub fn build_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(users::router())
        .merge(groups::router())
        .merge(quizzes::router())
        .merge(alerts::router())
        .merge(requests::router())
}

/// Full application: routes, CORS for the frontend origin, request tracing
pub fn build_app(state: AppState, frontend_origin: &str) -> Result<Router, BoxError> {
    let origin: HeaderValue = frontend_origin
        .parse()
        .map_err(|e| format!("FRONTEND_URL is not a valid origin: {e}"))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Ok(build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state))
}

/// Unwrap a JSON body, turning malformed input into an `InvalidRequest` error
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::invalid_request(e.body_text()))
}

/// Presence check for a required body field
pub(crate) fn required<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::required(field))
}
