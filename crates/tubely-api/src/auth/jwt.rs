//! HS256 access tokens.

use super::credential::AuthError;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `iss` claim of every access token accepted by the upload routes.
pub const ACCESS_TOKEN_ISSUER: &str = "tubely-access";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub iss: String,
    /// User id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Resolves a bearer token to the id of the user it was issued to.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Uuid, AuthError>;
}

pub struct JwtAuthenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ACCESS_TOKEN_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Sign an access token for `user_id` valid for `ttl`.
    pub fn issue(&self, user_id: Uuid, ttl: Duration) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AccessClaims {
            iss: ACCESS_TOKEN_ISSUER.to_string(),
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: &str) -> Result<Uuid, AuthError> {
        let data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters";

    #[tokio::test]
    async fn test_issue_and_authenticate() {
        let auth = JwtAuthenticator::new(SECRET);
        let user_id = Uuid::new_v4();

        let token = auth.issue(user_id, Duration::hours(1)).unwrap();
        assert_eq!(auth.authenticate(&token).await.unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_rejects_expired_token() {
        let auth = JwtAuthenticator::new(SECRET);
        // Past the default 60s leeway
        let token = auth.issue(Uuid::new_v4(), Duration::minutes(-5)).unwrap();

        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_token_signed_with_other_secret() {
        let issuer = JwtAuthenticator::new("another-secret-that-is-also-32-chars-long");
        let token = issuer.issue(Uuid::new_v4(), Duration::hours(1)).unwrap();

        let auth = JwtAuthenticator::new(SECRET);
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_rejects_wrong_issuer_and_bad_subject() {
        let key = EncodingKey::from_secret(SECRET.as_bytes());
        let now = Utc::now().timestamp();
        let auth = JwtAuthenticator::new(SECRET);

        let wrong_issuer = AccessClaims {
            iss: "someone-else".to_string(),
            sub: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(&Header::default(), &wrong_issuer, &key).unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken(_))
        ));

        let bad_subject = AccessClaims {
            iss: ACCESS_TOKEN_ISSUER.to_string(),
            sub: "not-a-uuid".to_string(),
            iat: now,
            exp: now + 3600,
        };
        let token = encode(&Header::default(), &bad_subject, &key).unwrap();
        assert_eq!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidSubject)
        );
    }
}
