//! Session tokens (HS256 JWT) and the `auth_token` cookie

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use shared::models::{Role, User};
use thiserror::Error;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "auth_token";

/// Claims stored in the session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User id
    pub sub: String,
    pub line_id: String,
    /// `None` until profile setup
    pub role: Option<Role>,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token generation failed: {0}")]
    Generation(String),
}

/// Signs and validates session tokens
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
    secure_cookie: bool,
}

impl SessionKeys {
    pub fn new(secret: &str, ttl_days: i64, secure_cookie: bool) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::days(ttl_days),
            secure_cookie,
        }
    }

    /// Issue a token for the user's current id, LINE id and role
    pub fn issue(&self, user: &User) -> Result<String, SessionError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            line_id: user.line_id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| SessionError::Generation(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["sub", "exp"]);

        decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => SessionError::Expired,
                _ => SessionError::Invalid(e.to_string()),
            })
    }

    /// `Set-Cookie` value carrying `token`
    pub fn cookie(&self, token: &str) -> String {
        let mut cookie = format!(
            "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
            self.ttl.num_seconds()
        );
        if self.secure_cookie {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Find the session cookie in a `Cookie` header value
pub fn token_from_cookie_header(header: &str) -> Option<&str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Option<Role>) -> User {
        User {
            id: 42,
            line_id: "U42".into(),
            display_name: "Taro".into(),
            role,
            points: 0,
            created_at: 0,
        }
    }

    #[test]
    fn issue_then_validate() {
        let keys = SessionKeys::new("test-secret", 7, false);
        let token = keys.issue(&user(Some(Role::Grandparent))).unwrap();
        let claims = keys.validate(&token).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.line_id, "U42");
        assert_eq!(claims.role, Some(Role::Grandparent));
        assert_eq!(claims.exp - claims.iat, 7 * 86_400);
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let token = SessionKeys::new("a", 7, false).issue(&user(None)).unwrap();
        let err = SessionKeys::new("b", 7, false).validate(&token).unwrap_err();
        assert!(matches!(err, SessionError::Invalid(_)));
    }

    #[test]
    fn expired_token_is_reported() {
        let keys = SessionKeys::new("s", 7, false);
        let claims = SessionClaims {
            sub: "1".into(),
            line_id: "U1".into(),
            role: None,
            iat: 1_000,
            exp: 2_000,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"s")).unwrap();
        assert!(matches!(keys.validate(&token), Err(SessionError::Expired)));
    }

    #[test]
    fn cookie_attributes() {
        let dev = SessionKeys::new("s", 7, false).cookie("tok");
        assert_eq!(
            dev,
            "auth_token=tok; HttpOnly; SameSite=Strict; Path=/; Max-Age=604800"
        );
        let prod = SessionKeys::new("s", 7, true).cookie("tok");
        assert!(prod.ends_with("; Secure"));
    }

    #[test]
    fn cookie_header_parsing() {
        assert_eq!(
            token_from_cookie_header("theme=dark; auth_token=abc.def; x=1"),
            Some("abc.def")
        );
        assert_eq!(token_from_cookie_header("auth_token="), None);
        assert_eq!(token_from_cookie_header("other=1"), None);
    }
}
