use axum::http::{header, HeaderMap};
use serde::Serialize;

use super::domain::UserId;

/// Authenticated caller, passed explicitly into the scoring pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: Option<String>,
}

impl AuthContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: UserId(user_id.into()),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Resolves a session token issued by the external auth provider.
pub trait SessionResolver: Send + Sync {
    fn resolve(&self, token: &str) -> Result<AuthContext, AuthError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("missing bearer credentials")]
    MissingCredentials,
    #[error("session is invalid or expired")]
    InvalidSession,
    #[error("digest trigger requires the shared secret")]
    InvalidSecret,
}

/// Extract the bearer token from an `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .ok_or(AuthError::MissingCredentials)?;

    if token.is_empty() {
        return Err(AuthError::MissingCredentials);
    }
    Ok(token)
}

/// Check a presented bearer token against a shared secret.
pub fn require_secret(headers: &HeaderMap, secret: &str) -> Result<(), AuthError> {
    match bearer_token(headers) {
        Ok(token) if secrets_match(token.as_bytes(), secret.as_bytes()) => Ok(()),
        _ => Err(AuthError::InvalidSecret),
    }
}

/// Byte comparison whose running time does not depend on where the inputs differ.
fn secrets_match(presented: &[u8], expected: &[u8]) -> bool {
    if presented.len() != expected.len() {
        return false;
    }

    let mut diff = 0u8;
    for (a, b) in presented.iter().zip(expected.iter()) {
        diff |= a ^ b;
    }
    diff == 0
}

pub fn authenticate(
    resolver: &dyn SessionResolver,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;
    resolver.resolve(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_token_requires_scheme_and_value() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingCredentials));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingCredentials));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer   "));
        assert_eq!(bearer_token(&headers), Err(AuthError::MissingCredentials));

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer token-123"),
        );
        assert_eq!(bearer_token(&headers), Ok("token-123"));
    }

    #[test]
    fn shared_secret_must_match_exactly() {
        assert!(secrets_match(b"cron-secret", b"cron-secret"));
        assert!(!secrets_match(b"cron-secret", b"cron-secreT"));
        assert!(!secrets_match(b"cron", b"cron-secret"));

        let mut headers = HeaderMap::new();
        assert_eq!(
            require_secret(&headers, "cron-secret"),
            Err(AuthError::InvalidSecret)
        );

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer cron-secret-extra"),
        );
        assert_eq!(
            require_secret(&headers, "cron-secret"),
            Err(AuthError::InvalidSecret)
        );

        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer cron-secret"),
        );
        assert_eq!(require_secret(&headers, "cron-secret"), Ok(()));
    }
}
