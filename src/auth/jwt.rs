use std::time::Duration;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use super::claims::{Claims, Identity};
use crate::config::JwtConfig;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),
}

/// Signing and verification keys plus the claims policy, built once from config.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenKeys {
    pub fn new(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            ttl: Duration::from_secs((cfg.ttl_minutes.max(1) as u64) * 60),
        }
    }

    pub fn issue(&self, identity: &Identity) -> anyhow::Result<String> {
        self.issue_at(identity, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, identity: &Identity, now: OffsetDateTime) -> anyhow::Result<String> {
        let exp = now + TimeDuration::seconds(self.ttl.as_secs() as i64);
        let claims = Claims {
            sub: identity.account_id,
            username: identity.username.clone(),
            is_admin: identity.is_admin,
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(account_id = %identity.account_id, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    /// Expiry is checked here against `now` with zero leeway rather than by
    /// jsonwebtoken's own clock.
    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Identity, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.validate_exp = false;
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        if now.unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(account_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn make_keys(secret: &str, issuer: &str, audience: &str) -> TokenKeys {
        TokenKeys::new(&JwtConfig {
            secret: secret.into(),
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_minutes: crate::config::DEFAULT_TOKEN_TTL_MINUTES,
        })
    }

    fn identity(username: &str, is_admin: bool) -> Identity {
        Identity {
            account_id: Uuid::new_v4(),
            username: username.into(),
            is_admin,
        }
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let who = identity("alice", true);
        let token = keys.issue(&who).expect("issue");
        let back = keys.verify(&token).expect("verify");
        assert_eq!(back, who);
    }

    #[test]
    fn token_valid_until_seven_days() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let issued = OffsetDateTime::now_utc();
        let token = keys.issue_at(&identity("bob", false), issued).expect("issue");

        let almost = issued + TimeDuration::days(7) - TimeDuration::seconds(1);
        assert!(keys.verify_at(&token, almost).is_ok());

        let at_expiry = issued + TimeDuration::days(7);
        assert!(matches!(keys.verify_at(&token, at_expiry), Err(TokenError::Expired)));
    }

    #[test]
    fn verify_rejects_expired_token() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let long_ago = OffsetDateTime::now_utc() - TimeDuration::days(30);
        let token = keys.issue_at(&identity("bob", false), long_ago).expect("issue");
        assert!(matches!(keys.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn verify_rejects_tampered_payload() {
        let keys = make_keys("dev-secret", "iss", "aud");
        let user_token = keys.issue(&identity("mallory", false)).unwrap();
        let admin_token = keys.issue(&identity("root", true)).unwrap();

        // Swap in another token's payload while keeping the original signature.
        let user_parts: Vec<&str> = user_token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", user_parts[0], admin_parts[1], user_parts[2]);

        assert!(matches!(keys.verify(&forged), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn verify_rejects_malformed_string() {
        let keys = make_keys("dev-secret", "iss", "aud");
        assert!(keys.verify("not-a-jwt").is_err());
        assert!(keys.verify("").is_err());
    }

    #[test]
    fn verify_rejects_foreign_secret_or_audience() {
        let good = make_keys("same-secret", "iss", "aud");
        let other_secret = make_keys("other-secret", "iss", "aud");
        let other_aud = make_keys("same-secret", "iss", "someone-else");
        let token = good.issue(&identity("carol", false)).unwrap();
        assert!(other_secret.verify(&token).is_err());
        assert!(other_aud.verify(&token).is_err());
    }
}
