//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, Request},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::auth::{Claims, Identity, TokenKeys};
use crate::web::error::ApiError;

/// Extractor for authenticated users.
///
/// Use this extractor to require authentication for a handler.
/// The handler will receive the token claims if the token is valid.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl AuthUser {
    /// The verified identity behind the token.
    pub fn identity(&self) -> Identity {
        Identity::from(&self.0)
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            // Try to get token from Authorization header first
            let token = if let Some(auth_header) = parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|value| value.to_str().ok())
            {
                auth_header.strip_prefix("Bearer ").map(|t| t.to_string())
            } else {
                None
            };

            // If no header token, try query parameter (for WebSocket upgrades
            // and other clients that cannot set headers)
            let token = match token {
                Some(t) => t,
                None => {
                    let query = parts.uri.query().unwrap_or("");
                    query
                        .split('&')
                        .find_map(|pair| {
                            let mut parts = pair.splitn(2, '=');
                            let key = parts.next()?;
                            let value = parts.next()?;
                            if key == "token" {
                                urlencoding::decode(value).ok().map(|s| s.into_owned())
                            } else {
                                None
                            }
                        })
                        .ok_or_else(|| ApiError::unauthorized("Missing authorization"))?
                }
            };

            // Get token keys from extensions (set by middleware)
            let keys = parts
                .extensions
                .get::<Arc<TokenKeys>>()
                .ok_or_else(|| ApiError::internal("Token keys not configured"))?;

            let claims = keys
                .verify(&token)
                .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

            Ok(AuthUser(claims))
        })
    }
}

/// Optional authentication extractor.
///
/// Similar to AuthUser but doesn't fail if no token is provided.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<Claims>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let auth_header = match parts
                .headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
            {
                Some(h) => h,
                None => return Ok(OptionalAuthUser(None)),
            };

            let token = match auth_header.strip_prefix("Bearer ") {
                Some(t) => t,
                None => return Ok(OptionalAuthUser(None)),
            };

            let keys = match parts.extensions.get::<Arc<TokenKeys>>() {
                Some(k) => k,
                None => return Ok(OptionalAuthUser(None)),
            };

            match keys.verify(token) {
                Ok(claims) => Ok(OptionalAuthUser(Some(claims))),
                Err(_) => Ok(OptionalAuthUser(None)),
            }
        })
    }
}

/// Middleware function to inject token keys into request extensions.
pub async fn jwt_auth(
    keys: Arc<TokenKeys>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.extensions_mut().insert(keys);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::User;

    fn test_user() -> User {
        User {
            id: 1,
            username: "alice".to_string(),
            display_name: "Alice".to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_auth_user_identity() {
        let keys = TokenKeys::new("test-secret", 3600);
        let token = keys.issue(&test_user()).unwrap();
        let claims = keys.verify(&token).unwrap();

        let auth = AuthUser(claims);
        let identity = auth.identity();
        assert_eq!(identity.user_id, 1);
        assert_eq!(identity.display_name, "Alice");
    }

    #[test]
    fn test_token_round_trip_via_keys() {
        let keys = TokenKeys::new("test-secret", 3600);
        let token = keys.issue(&test_user()).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.name, "Alice");
    }

    #[test]
    fn test_invalid_secret_rejected() {
        let keys = TokenKeys::new("secret1", 3600);
        let token = keys.issue(&test_user()).unwrap();

        let other_keys = TokenKeys::new("secret2", 3600);
        assert!(other_keys.verify(&token).is_err());
    }
}
