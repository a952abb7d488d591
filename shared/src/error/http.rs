//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::UserNotFound
            | Self::GroupNotFound
            | Self::QuizNotFound
            | Self::OptionNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::AlreadyAnswered => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::GrandparentRequired => StatusCode::FORBIDDEN,

            // 503 Service Unavailable (transient errors, client can retry)
            Self::NetworkError => StatusCode::SERVICE_UNAVAILABLE,

            // 500 Internal Server Error
            Self::InternalError | Self::GroupCodeExhausted => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::GroupRequired
            | Self::AlreadyInGroup
            | Self::PasswordTooShort
            | Self::InvalidAlertFrequency
            | Self::OptionMismatch
            | Self::QuestionTooLong
            | Self::TooFewOptions
            | Self::NoCorrectOption
            | Self::EmptyOptionText
            | Self::InsufficientPoints
            | Self::InvalidRequestType => StatusCode::BAD_REQUEST,
        }
    }
}
