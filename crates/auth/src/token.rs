//! Session token codec: issue and verify signed, time-bounded identity tokens.
//!
//! Tokens are HS256 JWTs over [`SessionClaims`]. Expiry is checked by
//! [`validate_claims`] against an explicit clock rather than by the JWT library,
//! so verification is deterministic under test.

use chrono::{DateTime, SubsecRound, Utc};
use jsonwebtoken::{errors::ErrorKind as JwtErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use quillpost_core::{DomainError, UserId};

use crate::claims::{session_ttl, validate_claims, ClaimsError, SessionClaims};
use crate::Identity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("jwt expired")]
    Expired,

    #[error("jwt malformed")]
    Malformed,

    #[error("invalid signature")]
    SignatureInvalid,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

impl From<TokenError> for DomainError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Signing(msg) => DomainError::internal(msg),
            other => DomainError::token(other.to_string()),
        }
    }
}

/// Issues and verifies session tokens with a shared server secret.
///
/// Constructed once at startup and shared read-only between requests.
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl core::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TokenCodec").finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn issue(&self, id: UserId, display_name: &str) -> Result<String, TokenError> {
        self.issue_at(id, display_name, Utc::now())
    }

    pub fn issue_at(
        &self,
        id: UserId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = now.trunc_subsecs(0);
        let claims = SessionClaims {
            sub: id,
            name: display_name.to_string(),
            iat,
            exp: iat + session_ttl(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Identity, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify signature, then the time window. Any failure yields no identity.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, TokenError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::InvalidSignature => TokenError::SignatureInvalid,
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                other => {
                    tracing::debug!(reason = ?other, "rejecting undecodable token");
                    TokenError::Malformed
                }
            })?;

        validate_claims(&data.claims, now).map_err(|e| match e {
            ClaimsError::Expired => TokenError::Expired,
            ClaimsError::NotYetValid | ClaimsError::InvalidTimeWindow => {
                tracing::debug!(reason = %e, "rejecting token with bad time window");
                TokenError::Malformed
            }
        })?;

        Ok(Identity::new(data.claims.sub, data.claims.name))
    }
}
