//! Session token issuance and validation.

use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use sha2::{Digest, Sha256};

use divert_core::db::unix_timestamp;

use super::claims::Claims;

/// A freshly signed session token.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    /// Session ID (the token's `jti`).
    pub session_id: String,
    pub expires_at: i64,
}

/// Manages session token creation and validation.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_secs: i64,
}

impl JwtManager {
    /// Create a new `JwtManager` with the given secret.
    pub fn new(secret: &[u8], ttl_secs: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            ttl_secs,
        }
    }

    /// Issue a session token for the given account.
    pub fn issue(
        &self,
        account_id: i64,
        name: &str,
    ) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = unix_timestamp();
        let exp = now + self.ttl_secs;
        let session_id = uuid::Uuid::new_v4().to_string();

        let claims = Claims {
            jti: session_id.clone(),
            sub: account_id.to_string(),
            name: name.to_string(),
            iat: now,
            exp,
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(IssuedToken {
            token,
            session_id,
            expires_at: exp,
        })
    }

    /// Validate a token's signature and expiry and return its claims.
    pub fn validate(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let data =
            jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &Validation::default())?;
        Ok(data.claims)
    }

    /// Hash a token for storage (raw tokens are never stored).
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_jwt() -> JwtManager {
        JwtManager::new(b"test-secret-key-for-testing", 3600)
    }

    #[test]
    fn issue_and_validate() {
        let jwt = test_jwt();
        let issued = jwt.issue(7, "alice").unwrap();

        let claims = jwt.validate(&issued.token).unwrap();
        assert_eq!(claims.account_id(), Some(7));
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.jti, issued.session_id);
        assert_eq!(claims.exp, issued.expires_at);
    }

    #[test]
    fn each_issue_is_a_new_session() {
        let jwt = test_jwt();
        let a = jwt.issue(1, "alice").unwrap();
        let b = jwt.issue(1, "alice").unwrap();
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn wrong_secret_fails_validation() {
        let jwt1 = test_jwt();
        let jwt2 = JwtManager::new(b"different-secret", 3600);

        let issued = jwt1.issue(1, "alice").unwrap();
        assert!(jwt2.validate(&issued.token).is_err());
        assert!(jwt1.validate("not-a-valid-token").is_err());
    }

    #[test]
    fn expired_token_fails_validation() {
        // Default validation allows 60s of leeway.
        let jwt = JwtManager::new(b"secret", -120);
        let issued = jwt.issue(1, "alice").unwrap();
        assert!(jwt.validate(&issued.token).is_err());
    }

    #[test]
    fn token_hash_is_deterministic() {
        let h1 = JwtManager::hash_token("same-token");
        assert_eq!(h1, JwtManager::hash_token("same-token"));
        assert_ne!(h1, JwtManager::hash_token("different-token"));
        assert_eq!(h1.len(), 64);
    }
}
