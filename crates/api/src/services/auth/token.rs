//! Bearer token issuing and verification (HS256 JWT).

use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use super::AuthError;
use crate::config::JwtConfig;

/// Token payload. `sub` carries the user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signing and verification keys derived from the configured secret.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtKeys {
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl: config.expires_in,
        }
    }

    /// Issue a token for `user_id` valid for the configured lifetime.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX);
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now,
            exp: now.saturating_add(ttl),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Token(e.to_string()))
    }

    /// Verify signature and expiry, returning the user id in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` for any malformed, forged or expired token.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        data.claims
            .sub
            .parse::<i32>()
            .map(UserId::new)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn keys(secret: &str, ttl_secs: u64) -> JwtKeys {
        JwtKeys::new(&JwtConfig {
            secret: SecretString::from(secret),
            expires_in: Duration::from_secs(ttl_secs),
        })
    }

    #[test]
    fn test_issued_token_verifies() {
        let keys = keys("k3Y!9vQz#Lp2@Wm8$Rt5^Xn7&Hb4*Jc6", 3_600);
        let token = keys.issue(UserId::new(17)).unwrap();
        assert_eq!(keys.verify(&token).unwrap(), UserId::new(17));
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = keys("first-signing-key-0123456789abcdef", 3_600)
            .issue(UserId::new(1))
            .unwrap();
        let result = keys("second-signing-key-0123456789abcdef", 3_600).verify(&token);
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys("k3Y!9vQz#Lp2@Wm8$Rt5^Xn7&Hb4*Jc6", 3_600);
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: "1".to_string(),
            iat: now - 7_200,
            exp: now - 3_600,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(matches!(keys.verify(&token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_garbage_rejected() {
        let keys = keys("k3Y!9vQz#Lp2@Wm8$Rt5^Xn7&Hb4*Jc6", 3_600);
        assert!(keys.verify("not-a-jwt").is_err());
    }
}
