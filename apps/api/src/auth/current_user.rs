use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use tracing::debug;

use crate::auth::identity::IdentityError;
use crate::errors::AppError;
use crate::state::AppState;

/// The authenticated caller, resolved per request from the
/// `Authorization: Bearer` token by the identity provider. The provider's
/// user id is trusted verbatim and never checked against local state.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
}

/// Extracts the bearer token from the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or(AppError::Unauthorized)
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers)?;
        let user = state
            .identity
            .user_from_token(token)
            .await
            .map_err(|e| match e {
                IdentityError::Rejected { status, message } => {
                    debug!("Token rejected by identity provider ({status}): {message}");
                    AppError::Unauthorized
                }
                IdentityError::Http(e) => AppError::Internal(anyhow::Error::new(e)),
            })?;
        Ok(CurrentUser { id: user.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_auth(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extracts_value() {
        let headers = headers_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers).unwrap_err(),
            AppError::Unauthorized
        ));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let headers = headers_with_auth("Basic dXNlcjpwYXNz");
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_bearer_token_rejects_empty_token() {
        let headers = headers_with_auth("Bearer ");
        assert!(bearer_token(&headers).is_err());
    }
}
