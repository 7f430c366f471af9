//! Token service: issuance, validation, and sliding refresh (IA-2, AC-12)
//!
//! Tokens are HS256-signed JWTs carrying [`AdminClaims`]. Validation is
//! stateless; the only storage access in the token lifecycle is the
//! account re-check performed by refresh callers.
//!
//! All expiry decisions take an explicit evaluation time. The middleware
//! reads the clock once per request and feeds that instant to both the
//! expiry check and the refresh-threshold check, so a request can never
//! straddle two clock readings.

use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::AdminClaims;
use crate::config::AuthConfig;
use crate::store::AdminUser;

/// Token lifecycle failures.
///
/// `Invalid` deliberately carries no detail: a forged signature, a
/// malformed payload, and a wrong subject type all look the same to the
/// caller (SI-11).
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signing failed; indicates key or serialization trouble, not input
    #[error("token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
    /// Token rejected: bad signature, malformed, or wrong claim shape
    #[error("token invalid")]
    Invalid,
    /// Token was valid but has expired
    #[error("token expired")]
    Expired,
    /// Claims violate an issuance invariant (e.g. `exp <= iat`, zero id)
    #[error("token claims invalid")]
    InvalidClaims,
}

/// Issues and validates admin access tokens.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    header: Header,
    validation: Validation,
    issuer: String,
    subject: String,
    ttl_secs: i64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked manually against the caller-supplied instant
        // so issuance, expiry, and refresh share one time source.
        validation.validate_exp = false;
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            header: Header::new(Algorithm::HS256),
            validation,
            issuer: config.issuer.clone(),
            subject: config.subject.clone(),
            ttl_secs: config.token_ttl.as_secs() as i64,
        }
    }

    /// Access-token lifetime in seconds.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Build claims for an account, valid from `now`.
    pub fn claims_for(&self, user: &AdminUser, now: i64) -> AdminClaims {
        AdminClaims::for_user(user, &self.issuer, &self.subject, now, self.ttl_secs)
    }

    /// Sign a claim set into a compact token string.
    pub fn issue(&self, claims: &AdminClaims) -> Result<String, TokenError> {
        if claims.exp <= claims.iat || claims.user_id == 0 {
            return Err(TokenError::InvalidClaims);
        }
        jsonwebtoken::encode(&self.header, claims, &self.encoding).map_err(TokenError::Signing)
    }

    /// Validate a token against the current clock.
    pub fn parse(&self, token: &str) -> Result<AdminClaims, TokenError> {
        self.parse_at(token, unix_now())
    }

    /// Validate a token as of the instant `now`.
    ///
    /// Checks, in order: signature and payload shape, subject type, claim
    /// invariants, expiry. Only the expiry check depends on `now`.
    pub fn parse_at(&self, token: &str, now: i64) -> Result<AdminClaims, TokenError> {
        let data = jsonwebtoken::decode::<AdminClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| TokenError::Invalid)?;
        let claims = data.claims;

        if claims.sub != self.subject {
            return Err(TokenError::Invalid);
        }
        if claims.user_id == 0 || claims.exp <= claims.iat {
            return Err(TokenError::InvalidClaims);
        }
        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// Issue a replacement token for an account, valid from `now`.
    ///
    /// Refresh is a full re-issue: the identity fields are re-read from
    /// the account record, so a stale nickname or email in the old token
    /// does not survive. The old token remains valid until its own expiry.
    pub fn refresh(&self, user: &AdminUser, now: i64) -> Result<(String, AdminClaims), TokenError> {
        let claims = self.claims_for(user, now);
        let token = self.issue(&claims)?;
        Ok((token, claims))
    }
}

/// Extract the token from an `Authorization` header value.
///
/// Requires exactly `"<scheme> <token>"` with a single separating space;
/// scheme comparison is case-sensitive, matching the value the login flow
/// hands out as `token_type`.
pub fn extract_bearer_token<'a>(header_value: &'a str, scheme: &str) -> Option<&'a str> {
    let rest = header_value.strip_prefix(scheme)?;
    let token = rest.strip_prefix(' ')?;
    if token.is_empty() || token.starts_with(' ') {
        return None;
    }
    Some(token)
}

/// Current Unix time in seconds.
pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
