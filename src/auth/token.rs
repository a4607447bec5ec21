//! JWT access token issuing and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::db::User;
use crate::{ReadRoomError, Result};

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// Display name.
    pub name: String,
    /// Issued at timestamp.
    pub iat: u64,
    /// Expiration timestamp.
    pub exp: u64,
    /// JWT ID (unique identifier).
    pub jti: String,
}

/// Server-verified identity bound to a connection or request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// User ID.
    pub user_id: i64,
    /// Display name.
    pub display_name: String,
}

impl From<&Claims> for Identity {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            display_name: claims.name.clone(),
        }
    }
}

/// Keys and settings for signing and verifying access tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_secs: u64,
}

impl TokenKeys {
    /// Create token keys from a secret.
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        Self {
            encoding_key,
            decoding_key,
            validation,
            expiry_secs,
        }
    }

    /// Issue an access token for a user.
    pub fn issue(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: user.id,
            name: user.display_name.clone(),
            iat: now,
            exp: now + self.expiry_secs,
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| ReadRoomError::Auth(e.to_string()))
    }

    /// Verify a token and return its claims.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                ReadRoomError::Auth("invalid or expired token".into())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(id: i64, display_name: &str) -> User {
        User {
            id,
            username: format!("user{id}"),
            display_name: display_name.to_string(),
            created_at: "2024-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let keys = TokenKeys::new("test-secret", 3600);
        let token = keys.issue(&test_user(1, "Alice")).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.name, "Alice");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_identity_from_claims() {
        let keys = TokenKeys::new("test-secret", 3600);
        let token = keys.issue(&test_user(7, "Bob")).unwrap();
        let claims = keys.verify(&token).unwrap();

        let identity = Identity::from(&claims);
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.display_name, "Bob");
    }

    #[test]
    fn test_verify_wrong_secret() {
        let keys = TokenKeys::new("secret1", 3600);
        let token = keys.issue(&test_user(1, "Alice")).unwrap();

        let other = TokenKeys::new("secret2", 3600);
        assert!(other.verify(&token).is_err());
    }

    #[test]
    fn test_verify_garbage() {
        let keys = TokenKeys::new("test-secret", 3600);
        assert!(keys.verify("not-a-token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = TokenKeys::new("test-secret", 3600);

        // Hand-roll an already expired claim set
        let now = chrono::Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: 1,
            name: "Alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(keys.verify(&token).is_err());
    }
}
