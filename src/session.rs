//! Session propagation: the signed token travels in an HTTP-only cookie.

use axum::http::{
    header::{InvalidHeaderValue, COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::Duration;

use crate::{model::CurrentUser, token::TokenKeys};

pub const SESSION_COOKIE: &str = "access_token";

/// Result of inspecting a request for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    /// No session cookie was sent.
    Anonymous,
    /// A cookie was sent but it failed signature or expiry checks.
    Invalid,
    Authenticated(CurrentUser),
}

/// `Set-Cookie` value carrying a freshly issued token.
/// Max-Age matches the token lifetime so the cookie never outlives it
/// and never expires before it.
pub fn session_cookie(
    token: &str,
    ttl: Duration,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE,
        token,
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// `Set-Cookie` value that removes the session cookie.
pub fn cleared_cookie() -> HeaderValue {
    HeaderValue::from_static("access_token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Find the session token among the request's `Cookie` headers.
pub fn read_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token)
        .filter(|token| !token.is_empty())
}

pub fn resolve(headers: &HeaderMap, keys: &TokenKeys) -> Identity {
    let Some(token) = read_token(headers) else {
        return Identity::Anonymous;
    };

    match keys.validate(token) {
        Ok(claims) => Identity::Authenticated(CurrentUser {
            id: claims.id,
            username: claims.username,
            role: claims.role,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "rejected session token");
            Identity::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test_secret", Duration::minutes(20))
    }

    fn headers_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi", Duration::minutes(20), false).unwrap();
        let cookie = cookie.to_str().unwrap();

        assert!(cookie.starts_with("access_token=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=1200"));
        assert!(!cookie.contains("Secure"));

        let secure = session_cookie("abc", Duration::minutes(1), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn test_cleared_cookie_targets_session() {
        let cleared = cleared_cookie();
        let cleared = cleared.to_str().unwrap();

        assert!(cleared.starts_with(&format!("{}=;", SESSION_COOKIE)));
        assert!(cleared.contains("Max-Age=0"));
    }

    #[test]
    fn test_read_token() {
        assert_eq!(read_token(&HeaderMap::new()), None);
        assert_eq!(read_token(&headers_with("theme=dark")), None);
        assert_eq!(read_token(&headers_with("access_token=")), None);
        assert_eq!(
            read_token(&headers_with("theme=dark; access_token=abc.def")),
            Some("abc.def")
        );
    }

    #[test]
    fn test_resolve() {
        let keys = keys();
        assert_eq!(resolve(&HeaderMap::new(), &keys), Identity::Anonymous);
        assert_eq!(resolve(&headers_with("access_token=junk"), &keys), Identity::Invalid);

        let token = keys.issue("alice", 1, "user", None).unwrap();
        let identity = resolve(&headers_with(&format!("access_token={}", token)), &keys);
        assert_eq!(
            identity,
            Identity::Authenticated(CurrentUser {
                id: 1,
                username: "alice".to_string(),
                role: "user".to_string(),
            })
        );

        let expired = keys
            .issue("alice", 1, "user", Some(Duration::seconds(-5)))
            .unwrap();
        let identity = resolve(&headers_with(&format!("access_token={}", expired)), &keys);
        assert_eq!(identity, Identity::Invalid);
    }
}
