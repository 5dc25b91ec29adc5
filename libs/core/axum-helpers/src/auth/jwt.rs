use super::config::JwtConfig;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,   // Subject (user ID)
    pub email: String, // User email
    pub name: String,  // User name
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
    pub jti: String,   // Token ID
}

impl JwtClaims {
    /// The subject parsed back into a user ID.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Stateless HS256 token issuer and verifier.
#[derive(Clone)]
pub struct JwtAuth {
    secret: String,
    ttl_secs: i64,
}

impl JwtAuth {
    pub fn new(config: &JwtConfig) -> Self {
        tracing::info!(ttl_secs = config.ttl_secs, "JWT auth initialized");
        Self {
            secret: config.secret.clone(),
            ttl_secs: config.ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Sign a token for the given user.
    pub fn create_token(&self, user_id: Uuid, email: &str, name: &str) -> eyre::Result<String> {
        let now = Utc::now();

        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            name: name.to_string(),
            exp: (now + Duration::seconds(self.ttl_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )?;

        Ok(token)
    }

    /// Verify signature and expiry, then decode the claims.
    pub fn verify_token(&self, token: &str) -> eyre::Result<JwtClaims> {
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth(ttl_secs: i64) -> JwtAuth {
        let config = JwtConfig::new("this-is-a-valid-secret-with-32-chars!")
            .unwrap()
            .with_ttl_secs(ttl_secs);
        JwtAuth::new(&config)
    }

    #[test]
    fn test_token_carries_identity() {
        let auth = auth(3600);
        let user_id = Uuid::now_v7();

        let token = auth.create_token(user_id, "ada@example.com", "Ada").unwrap();
        let claims = auth.verify_token(&token).unwrap();

        assert_eq!(claims.user_id(), Some(user_id));
        assert_eq!(claims.email, "ada@example.com");
        assert_eq!(claims.name, "Ada");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Beyond the default 60s leeway
        let auth = auth(-120);
        let token = auth.create_token(Uuid::now_v7(), "a@b.co", "A").unwrap();
        assert!(auth.verify_token(&token).is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let other = JwtAuth::new(
            &JwtConfig::new("another-secret-that-is-also-32-chars-long").unwrap(),
        );
        let token = other.create_token(Uuid::now_v7(), "a@b.co", "A").unwrap();
        assert!(auth(3600).verify_token(&token).is_err());
    }
}
