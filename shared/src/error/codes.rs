//! Unified error codes for the check-in service
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Group errors
//! - 4xxx: Quiz errors
//! - 5xxx: Request (point economy) errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the frontend can switch
/// on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Authorization code or ID token rejected by the identity provider
    InvalidCredentials = 1002,
    /// Session token has expired
    TokenExpired = 1003,
    /// Session token is invalid
    TokenInvalid = 1004,
    /// Authenticated user no longer exists
    UserNotFound = 1005,

    // ==================== 2xxx: Permission ====================
    /// Grandparent role required
    GrandparentRequired = 2002,

    // ==================== 3xxx: Group ====================
    /// Group code or password did not match
    GroupNotFound = 3001,
    /// Caller does not belong to any group
    GroupRequired = 3002,
    /// Caller already belongs to a group
    AlreadyInGroup = 3003,
    /// Could not find a free group code
    GroupCodeExhausted = 3004,
    /// Group password too short
    PasswordTooShort = 3005,
    /// Alert frequency below the minimum
    InvalidAlertFrequency = 3006,

    // ==================== 4xxx: Quiz ====================
    /// Quiz not found
    QuizNotFound = 4001,
    /// Quiz option not found
    OptionNotFound = 4002,
    /// Option belongs to a different quiz
    OptionMismatch = 4003,
    /// Quiz already answered by this user
    AlreadyAnswered = 4004,
    /// Question text too long
    QuestionTooLong = 4005,
    /// Fewer than two options
    TooFewOptions = 4006,
    /// No option marked correct
    NoCorrectOption = 4007,
    /// Option text empty
    EmptyOptionText = 4008,

    // ==================== 5xxx: Request ====================
    /// Not enough points to send a request
    InsufficientPoints = 5001,
    /// Request type is not `quiz` or `other`
    InvalidRequestType = 5002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Network error
    NetworkError = 9003,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid authorization code",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::UserNotFound => "User not found",

            // Permission
            ErrorCode::GrandparentRequired => "Only grandparents can perform this action",

            // Group
            ErrorCode::GroupNotFound => "Group not found or password incorrect",
            ErrorCode::GroupRequired => "You do not belong to a group",
            ErrorCode::AlreadyInGroup => "You already belong to a group",
            ErrorCode::GroupCodeExhausted => "Failed to generate a group code, please retry",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::InvalidAlertFrequency => "Alert frequency must be at least 0.5 days",

            // Quiz
            ErrorCode::QuizNotFound => "Quiz not found",
            ErrorCode::OptionNotFound => "Option not found",
            ErrorCode::OptionMismatch => "Selected option does not belong to this quiz",
            ErrorCode::AlreadyAnswered => "You have already answered this quiz",
            ErrorCode::QuestionTooLong => "Question text must be at most 100 characters",
            ErrorCode::TooFewOptions => "At least two options are required",
            ErrorCode::NoCorrectOption => "At least one option must be correct",
            ErrorCode::EmptyOptionText => "Option text must not be empty",

            // Request
            ErrorCode::InsufficientPoints => "Not enough points",
            ErrorCode::InvalidRequestType => "Request type must be 'quiz' or 'other'",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::NetworkError => "Network error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1005 => Ok(ErrorCode::UserNotFound),

            // Permission
            2002 => Ok(ErrorCode::GrandparentRequired),

            // Group
            3001 => Ok(ErrorCode::GroupNotFound),
            3002 => Ok(ErrorCode::GroupRequired),
            3003 => Ok(ErrorCode::AlreadyInGroup),
            3004 => Ok(ErrorCode::GroupCodeExhausted),
            3005 => Ok(ErrorCode::PasswordTooShort),
            3006 => Ok(ErrorCode::InvalidAlertFrequency),

            // Quiz
            4001 => Ok(ErrorCode::QuizNotFound),
            4002 => Ok(ErrorCode::OptionNotFound),
            4003 => Ok(ErrorCode::OptionMismatch),
            4004 => Ok(ErrorCode::AlreadyAnswered),
            4005 => Ok(ErrorCode::QuestionTooLong),
            4006 => Ok(ErrorCode::TooFewOptions),
            4007 => Ok(ErrorCode::NoCorrectOption),
            4008 => Ok(ErrorCode::EmptyOptionText),

            // Request
            5001 => Ok(ErrorCode::InsufficientPoints),
            5002 => Ok(ErrorCode::InvalidRequestType),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9003 => Ok(ErrorCode::NetworkError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}
