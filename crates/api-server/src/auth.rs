//! Shared-secret authentication for the `/api` routes.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sha2::{Digest, Sha256};

use crate::{ApiResponse, AppState};

/// Headers checked in order; the last carries `Bearer <token>`.
const KEY_HEADER: &str = "X-API-Key";
const TOKEN_HEADER: &str = "X-API-Token";
const BEARER_HEADER: &str = "Authorization";

/// Compare fixed-length digests so the check does not leak key length or prefix.
fn hash_key(key: &str) -> String {
    hex::encode(Sha256::digest(key.as_bytes()))
}

/// Reject `/api` requests whose key matches none of the configured keys.
///
/// With no keys configured every request passes (development mode).
pub async fn auth_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    if state.config.api_keys.is_empty() {
        return Ok(next.run(request).await);
    }

    let provided = extract_api_key(&headers).ok_or(AuthError::MissingApiKey)?;
    let provided_hash = hash_key(&provided);
    if !state.config.api_keys.iter().any(|key| hash_key(key) == provided_hash) {
        tracing::warn!(
            "Invalid API key on {} {}: {}",
            request.method(),
            request.uri().path(),
            mask_api_key(&provided)
        );
        return Err(AuthError::InvalidApiKey);
    }

    Ok(next.run(request).await)
}

pub(crate) fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    for name in [KEY_HEADER, TOKEN_HEADER] {
        if let Some(key) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !key.is_empty() {
                return Some(key.to_string());
            }
        }
    }

    headers
        .get(BEARER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// First and last 4 characters only
pub(crate) fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

#[derive(Debug)]
pub enum AuthError {
    MissingApiKey,
    InvalidApiKey,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingApiKey => write!(f, "Missing API key"),
            AuthError::InvalidApiKey => write!(f, "Invalid API key"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingApiKey => {
                "Missing API key. Provide via X-API-Key, X-API-Token or Authorization: Bearer header."
            }
            AuthError::InvalidApiKey => "Invalid API key.",
        };
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.to_string()),
        };
        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_prefers_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", HeaderValue::from_static("Bearer from-bearer"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-bearer"));

        headers.insert("X-API-Token", HeaderValue::from_static("from-token"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-token"));

        headers.insert("X-API-Key", HeaderValue::from_static("from-key"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("from-key"));
    }

    #[test]
    fn test_extract_ignores_empty_and_basic_auth() {
        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", HeaderValue::from_static(""));
        headers.insert("Authorization", HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(extract_api_key(&headers).is_none());
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key("short"), "****");
        assert_eq!(mask_api_key("abcd1234efgh5678"), "abcd...5678");
    }

    #[test]
    fn test_hash_is_fixed_length() {
        assert_eq!(hash_key("a").len(), 64);
        assert_eq!(hash_key("a much longer secret value").len(), 64);
        assert_ne!(hash_key("a"), hash_key("b"));
    }
}
