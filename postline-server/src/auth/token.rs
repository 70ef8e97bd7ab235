//! Bearer token issuance and verification
//!
//! Tokens are HMAC-signed JWTs carrying `user_id` and `exp` (unix seconds).
//! They are stateless: expiry is the only invalidation mechanism.
//! The current time is passed in so expiry is checked against the caller's clock.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Default token lifetime (30 minutes)
pub const DEFAULT_TTL_SECS: i64 = 30 * 60;

/// Token payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i32,
    pub exp: i64,
}

/// Token errors
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("token lifetime must be positive, got {0}s")]
    InvalidTtl(i64),

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("token expired")]
    Expired,
}

/// Issues and verifies signed access tokens
#[derive(Clone)]
pub struct TokenService {
    algorithm: Algorithm,
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// Only HMAC algorithms (HS256, HS384, HS512) are accepted since the key is a shared secret.
    pub fn new(secret: &str, algorithm: &str, ttl_secs: i64) -> Result<Self, TokenError> {
        let algorithm = Algorithm::from_str(algorithm.trim())
            .ok()
            .filter(|alg| matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512))
            .ok_or_else(|| TokenError::UnsupportedAlgorithm(algorithm.to_owned()))?;

        if ttl_secs <= 0 {
            return Err(TokenError::InvalidTtl(ttl_secs));
        }

        Ok(Self {
            algorithm,
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Issue a token for `subject_id` expiring at `now + ttl`.
    ///
    /// `exp` is whole unix seconds; the fraction of `now + ttl` is dropped, so
    /// a token issued mid-second expires up to one second early.
    pub fn issue(&self, subject_id: i32, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            user_id: subject_id,
            exp: (now + self.ttl).timestamp(),
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Verify a token and return its subject id.
    ///
    /// Fails on a bad signature, a different header algorithm, an unparseable
    /// payload, or `exp <= now`. No leeway is applied.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<i32, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        // Expiry is checked below against the supplied clock
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::from(["exp".to_string()]);

        let data =
            decode::<Claims>(token, &self.decoding, &validation).map_err(TokenError::Invalid)?;

        if data.claims.exp <= now.timestamp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims.user_id)
    }
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("algorithm", &self.algorithm)
            .field("ttl_secs", &self.ttl.num_seconds())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn service() -> TokenService {
        TokenService::new("test-secret", "HS256", 1800).unwrap()
    }

    #[test]
    fn verifies_within_window() {
        let tokens = service();
        let issued = at(1_700_000_000);
        let token = tokens.issue(42, issued).unwrap();

        assert_eq!(tokens.verify(&token, issued).unwrap(), 42);
        assert_eq!(tokens.verify(&token, at(1_700_000_000 + 1799)).unwrap(), 42);
    }

    #[test]
    fn fails_at_and_after_expiry() {
        let tokens = service();
        let token = tokens.issue(42, at(1_700_000_000)).unwrap();

        assert!(matches!(
            tokens.verify(&token, at(1_700_000_000 + 1800)),
            Err(TokenError::Expired)
        ));
        assert!(matches!(
            tokens.verify(&token, at(1_700_000_000 + 7200)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn expiry_truncates_to_whole_seconds() {
        let tokens = service();
        let issued = Utc.timestamp_opt(1_700_000_000, 600_000_000).unwrap();
        let token = tokens.issue(42, issued).unwrap();

        let just_before_second = Utc.timestamp_opt(1_700_001_799, 999_000_000).unwrap();
        assert_eq!(tokens.verify(&token, just_before_second).unwrap(), 42);

        // Still inside [issued, issued + ttl) but past the truncated exp
        let inside_fraction = Utc.timestamp_opt(1_700_001_800, 300_000_000).unwrap();
        assert!(inside_fraction < issued + Duration::seconds(1800));
        assert!(matches!(
            tokens.verify(&token, inside_fraction),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = service().issue(1, at(1_700_000_000)).unwrap();
        let other = TokenService::new("other-secret", "HS256", 1800).unwrap();

        assert!(matches!(
            other.verify(&token, at(1_700_000_000)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_algorithm_mismatch() {
        let token = TokenService::new("test-secret", "HS512", 1800)
            .unwrap()
            .issue(1, at(1_700_000_000))
            .unwrap();

        assert!(matches!(
            service().verify(&token, at(1_700_000_000)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn rejects_garbage() {
        let tokens = service();
        for bad in ["", "abc", "a.b.c", "Bearer xyz"] {
            assert!(matches!(
                tokens.verify(bad, at(1_700_000_000)),
                Err(TokenError::Invalid(_))
            ));
        }
    }

    #[test]
    fn rejects_payload_without_subject() {
        #[derive(Serialize)]
        struct NoSubject {
            exp: i64,
        }

        let token = encode(
            &Header::new(Algorithm::HS256),
            &NoSubject { exp: 1_700_000_000 + 60 },
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service().verify(&token, at(1_700_000_000)),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn construction_rejects_bad_config() {
        assert!(matches!(
            TokenService::new("s", "RS256", 60),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            TokenService::new("s", "nope", 60),
            Err(TokenError::UnsupportedAlgorithm(_))
        ));
        assert!(matches!(
            TokenService::new("s", "HS256", 0),
            Err(TokenError::InvalidTtl(0))
        ));
    }
}
