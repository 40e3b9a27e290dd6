use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Identity carried inside a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub id: i64,
    pub role: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
}

/// Signing material and default lifetime, built once from configuration.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    default_ttl: Duration,
}

impl TokenKeys {
    pub fn new(secret: &str, default_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Sign a token for `username`/`user_id` that expires after `ttl`
    /// (or the configured default).
    pub fn issue(
        &self,
        username: &str,
        user_id: i64,
        role: &str,
        ttl: Option<Duration>,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let expires = now + ttl.unwrap_or(self.default_ttl);

        let claims = Claims {
            username: username.to_string(),
            id: user_id,
            role: role.to_string(),
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        // jsonwebtoken treats `exp == now` as still valid
        if data.claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(secret: &str) -> TokenKeys {
        TokenKeys::new(secret, Duration::minutes(20))
    }

    #[test]
    fn test_issue_and_validate() {
        let keys = keys("test_secret");
        let token = keys.issue("alice", 7, "user", None).unwrap();
        let claims = keys.validate(&token).unwrap();

        assert_eq!(claims.username, "alice");
        assert_eq!(claims.id, 7);
        assert_eq!(claims.role, "user");
        assert_eq!(claims.exp - claims.iat, 20 * 60);
    }

    #[test]
    fn test_explicit_ttl() {
        let keys = keys("test_secret");
        let token = keys.issue("alice", 7, "user", Some(Duration::seconds(90))).unwrap();
        let claims = keys.validate(&token).unwrap();

        assert_eq!(claims.exp - claims.iat, 90);
    }

    #[test]
    fn test_wrong_secret() {
        let token = keys("correct_secret").issue("alice", 7, "user", None).unwrap();
        let result = keys("wrong_secret").validate(&token);

        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token() {
        let keys = keys("test_secret");
        let token = keys.issue("alice", 7, "user", Some(Duration::seconds(-1))).unwrap();

        assert!(matches!(keys.validate(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_token_expires_after_ttl() {
        let keys = keys("test_secret");
        let token = keys.issue("alice", 7, "user", Some(Duration::seconds(1))).unwrap();

        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert!(matches!(keys.validate(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn test_malformed_and_tampered() {
        let keys = keys("test_secret");
        assert!(matches!(keys.validate("garbage"), Err(AuthError::InvalidToken)));

        let token = keys.issue("alice", 7, "user", None).unwrap();
        let forged = keys.issue("mallory", 8, "user", None).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let spliced = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        assert!(matches!(keys.validate(&spliced), Err(AuthError::InvalidToken)));
    }
}
