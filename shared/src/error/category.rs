//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 2xxx: Permission errors
/// - 3xxx: Group errors
/// - 4xxx: Quiz errors
/// - 5xxx: Request errors
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Permission errors (2xxx)
    Permission,
    /// Group errors (3xxx)
    Group,
    /// Quiz errors (4xxx)
    Quiz,
    /// Request errors (5xxx)
    Request,
    /// System errors (6xxx and above)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            2000..3000 => Self::Permission,
            3000..4000 => Self::Group,
            4000..5000 => Self::Quiz,
            5000..6000 => Self::Request,
            _ => Self::System,
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_code() {
        assert_eq!(ErrorCategory::from_code(2), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(999), ErrorCategory::General);
        assert_eq!(ErrorCategory::from_code(1001), ErrorCategory::Auth);
        assert_eq!(ErrorCategory::from_code(2002), ErrorCategory::Permission);
        assert_eq!(ErrorCategory::from_code(3001), ErrorCategory::Group);
        assert_eq!(ErrorCategory::from_code(4004), ErrorCategory::Quiz);
        assert_eq!(ErrorCategory::from_code(5001), ErrorCategory::Request);
        assert_eq!(ErrorCategory::from_code(9001), ErrorCategory::System);
        assert_eq!(ErrorCategory::from_code(10000), ErrorCategory::System);
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::TokenInvalid.category(), ErrorCategory::Auth);
        assert_eq!(
            ErrorCode::GrandparentRequired.category(),
            ErrorCategory::Permission
        );
        assert_eq!(ErrorCode::AlreadyInGroup.category(), ErrorCategory::Group);
        assert_eq!(ErrorCode::NoCorrectOption.category(), ErrorCategory::Quiz);
        assert_eq!(
            ErrorCode::InsufficientPoints.category(),
            ErrorCategory::Request
        );
        assert_eq!(ErrorCode::NetworkError.category(), ErrorCategory::System);
    }

    #[test]
    fn test_category_serialize() {
        let json = serde_json::to_string(&ErrorCategory::Group).unwrap();
        assert_eq!(json, "\"group\"");

        let category: ErrorCategory = serde_json::from_str("\"system\"").unwrap();
        assert_eq!(category, ErrorCategory::System);
    }
}
