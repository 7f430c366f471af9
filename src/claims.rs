//! Token claims for admin sessions
//!
//! The claim set is self-contained (IA-2): everything the middleware needs
//! to bind an identity to a request travels inside the token, so validation
//! never touches the credential store.

use serde::{Deserialize, Serialize};

use crate::store::AdminUser;

/// Claims carried by every admin access token.
///
/// Identity fields (`user_id`, `mobile`, `nickname`, `email`) are copied
/// from the account record at issuance time; a profile change only becomes
/// visible after the next issue or refresh. Registered claims follow RFC
/// 7519: `iat`/`exp` are Unix seconds and `exp` is strictly greater than
/// `iat` for any token this crate signs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminClaims {
    pub user_id: u64,
    pub mobile: String,
    pub nickname: String,
    pub email: String,

    /// Issuer (`iss`)
    pub iss: String,
    /// Subject type (`sub`), e.g. `"admin"`; parsing rejects other values
    pub sub: String,
    /// Issued-at, Unix seconds
    pub iat: i64,
    /// Expiry, Unix seconds
    pub exp: i64,
}

impl AdminClaims {
    /// Build claims for an account, valid from `now` for `ttl_secs`.
    pub fn for_user(user: &AdminUser, issuer: &str, subject: &str, now: i64, ttl_secs: i64) -> Self {
        Self {
            user_id: user.id,
            mobile: user.mobile.clone(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            iss: issuer.to_string(),
            sub: subject.to_string(),
            iat: now,
            exp: now + ttl_secs,
        }
    }

    /// Seconds of validity remaining at `now`. Negative once expired.
    pub fn remaining(&self, now: i64) -> i64 {
        self.exp - now
    }

    /// Whether the token has expired as of `now`. Expiry is exclusive:
    /// a token is still valid at the exact `exp` second boundary minus one,
    /// and rejected once `now >= exp`.
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.exp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::UserStatus;

    fn user() -> AdminUser {
        AdminUser {
            id: 42,
            username: "ops".to_string(),
            password_hash: String::new(),
            status: UserStatus::Enabled,
            is_admin: true,
            mobile: "13800000000".to_string(),
            nickname: "Ops".to_string(),
            email: "ops@example.com".to_string(),
        }
    }

    #[test]
    fn test_for_user_copies_identity() {
        let claims = AdminClaims::for_user(&user(), "portcullis", "admin", 1_000, 3_600);
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.nickname, "Ops");
        assert_eq!(claims.iat, 1_000);
        assert_eq!(claims.exp, 4_600);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expiry_boundary() {
        let claims = AdminClaims::for_user(&user(), "portcullis", "admin", 1_000, 60);
        assert!(!claims.is_expired(1_059));
        assert!(claims.is_expired(1_060));
        assert_eq!(claims.remaining(1_030), 30);
    }
}
