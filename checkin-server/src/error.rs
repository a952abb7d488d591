//! Unified service-layer error type
//!
//! `ServiceError` bridges repository errors and the API-layer `AppError`, so
//! services can use `?` on both without mapping by hand.

use axum::response::IntoResponse;
use shared::error::{AppError, ErrorCode};

use crate::db::RepoError;

/// Service-layer error
///
/// - `Repo`: storage failures (logged, mapped to InternalError)
/// - `App`: business-rule errors (passed through to the client)
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    App(AppError),
}

impl From<RepoError> for ServiceError {
    fn from(e: RepoError) -> Self {
        ServiceError::Repo(e)
    }
}

impl From<AppError> for ServiceError {
    fn from(e: AppError) -> Self {
        ServiceError::App(e)
    }
}

impl From<ErrorCode> for ServiceError {
    fn from(code: ErrorCode) -> Self {
        ServiceError::App(AppError::new(code))
    }
}

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::App(app_err) => app_err,
            ServiceError::Repo(repo_err) => {
                tracing::error!(error = %repo_err, "Service repository error");
                AppError::new(ErrorCode::InternalError)
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl ServiceError {
    /// Error code this error will surface as
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::App(e) => e.code,
            ServiceError::Repo(_) => ErrorCode::InternalError,
        }
    }
}

/// Convenience type alias for service-layer results
pub type ServiceResult<T> = Result<T, ServiceError>;
