//! Login flow: credential verification and token issuance (IA-2, IA-5)
//!
//! Verifies a username/password pair against the credential store and
//! issues the initial access token. Unknown and disabled accounts produce
//! an identical client-visible failure so the endpoint cannot be used to
//! enumerate valid usernames.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;
use crate::middleware::AuthState;
use crate::observability::SecurityEvent;
use crate::security_event;
use crate::store::CredentialStore;
use crate::token::{extract_bearer_token, unix_now, TokenService};

/// Successful login response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    /// Scheme clients must prefix the token with, e.g. `Bearer`
    pub token_type: String,
    /// Expiry of the access token, Unix seconds
    pub expires_at: i64,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Verifies credentials and issues tokens.
#[derive(Clone)]
pub struct LoginService {
    tokens: TokenService,
    credentials: Arc<dyn CredentialStore>,
    scheme: String,
}

impl LoginService {
    pub fn new(tokens: TokenService, credentials: Arc<dyn CredentialStore>, scheme: String) -> Self {
        Self {
            tokens,
            credentials,
            scheme,
        }
    }

    /// Authenticate a username/password pair and issue an access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        self.login_at(username, password, unix_now()).await
    }

    /// [`login`](Self::login) with an explicit issuance instant.
    pub async fn login_at(
        &self,
        username: &str,
        password: &str,
        now: i64,
    ) -> Result<TokenPair, AuthError> {
        let user = self
            .credentials
            .find_by_username(username)
            .await
            .map_err(AuthError::UserLookupFailed)?;

        // Unknown and disabled accounts are indistinguishable to the caller
        let user = match user {
            Some(u) if u.is_enabled() => u,
            _ => {
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    username = %username,
                    reason = "unknown_or_disabled",
                    "Login rejected"
                );
                return Err(AuthError::UserNotFound);
            }
        };

        match user.verify_password(password) {
            Ok(true) => {}
            Ok(false) => {
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    username = %username,
                    reason = "invalid_password",
                    "Login rejected"
                );
                return Err(AuthError::InvalidCredentials);
            }
            Err(e) => {
                // The stored hash is unusable; an operator problem, but the
                // client only learns the credentials did not verify
                tracing::error!(username = %username, error = %e, "Stored password hash unusable");
                return Err(AuthError::InvalidCredentials);
            }
        }

        let claims = self.tokens.claims_for(&user, now);
        let access_token = self.tokens.issue(&claims).map_err(AuthError::TokenIssuance)?;

        security_event!(
            SecurityEvent::AuthenticationSuccess,
            user_id = %user.id,
            username = %username,
            "User authenticated"
        );

        Ok(TokenPair {
            access_token,
            token_type: self.scheme.clone(),
            expires_at: claims.exp,
        })
    }

    /// Re-issue a token for an already-authenticated account.
    ///
    /// The account is re-read from the credential store, so an account
    /// disabled or deleted since login cannot extend its session.
    pub async fn refresh(&self, user_id: u64) -> Result<TokenPair, AuthError> {
        self.refresh_at(user_id, unix_now()).await
    }

    /// [`refresh`](Self::refresh) with an explicit issuance instant.
    pub async fn refresh_at(&self, user_id: u64, now: i64) -> Result<TokenPair, AuthError> {
        let user = self
            .credentials
            .find_by_id(user_id)
            .await
            .map_err(AuthError::UserLookupFailed)?;

        let user = match user {
            Some(u) if u.is_enabled() => u,
            _ => {
                security_event!(
                    SecurityEvent::TokenRefreshFailed,
                    user_id = %user_id,
                    reason = "unknown_or_disabled",
                    "Refresh refused"
                );
                return Err(AuthError::UserNotFound);
            }
        };

        let (access_token, claims) = self
            .tokens
            .refresh(&user, now)
            .map_err(AuthError::TokenIssuance)?;

        security_event!(
            SecurityEvent::TokenRefreshed,
            user_id = %user.id,
            expires_at = claims.exp,
            "Token refreshed"
        );

        Ok(TokenPair {
            access_token,
            token_type: self.scheme.clone(),
            expires_at: claims.exp,
        })
    }
}

/// Router exposing `POST /login` and `POST /refresh`.
///
/// Mount this *outside* the session middleware; login is how a session is
/// obtained in the first place, and refresh authenticates itself from the
/// presented token.
pub fn router(state: AuthState) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler))
        .with_state(state)
}

async fn login_handler(
    State(state): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Response {
    let locale = state.config.locale;
    match state.login_service().login(&req.username, &req.password).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(err) => err.respond(locale),
    }
}

/// Explicit refresh: authenticated by the presented (still valid) token.
async fn refresh_handler(State(state): State<AuthState>, request: axum::extract::Request) -> Response {
    let locale = state.config.locale;

    let claims = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| extract_bearer_token(v, &state.config.header_scheme))
        .and_then(|token| state.tokens.parse(token).ok());

    let claims = match claims {
        Some(c) => c,
        None => return AuthError::NotAuthenticated.respond(locale),
    };

    match state.login_service().refresh(claims.user_id).await {
        Ok(pair) => (StatusCode::OK, Json(pair)).into_response(),
        Err(err) => err.respond(locale),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::password::hash_password;
    use crate::store::{AdminUser, MemoryCredentialStore, UserStatus};

    fn store_with_user(status: UserStatus) -> Arc<MemoryCredentialStore> {
        let store = MemoryCredentialStore::new();
        store
            .insert(AdminUser {
                id: 1,
                username: "admin".to_string(),
                password_hash: hash_password("s3cret").unwrap(),
                status,
                is_admin: true,
                mobile: "13800000000".to_string(),
                nickname: "Admin".to_string(),
                email: "admin@example.com".to_string(),
            })
            .unwrap();
        Arc::new(store)
    }

    fn service(credentials: Arc<MemoryCredentialStore>) -> LoginService {
        let config = crate::AuthConfig::builder()
            .secret("login-test-secret")
            .build()
            .unwrap();
        LoginService::new(TokenService::new(&config), credentials, "Bearer".to_string())
    }

    #[tokio::test]
    async fn test_login_success() {
        let svc = service(store_with_user(UserStatus::Enabled));
        let pair = svc.login_at("admin", "s3cret", 1_000).await.unwrap();

        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.expires_at, 1_000 + 3_600);
        assert!(!pair.access_token.is_empty());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let svc = service(store_with_user(UserStatus::Enabled));
        let err = svc.login_at("admin", "wrong", 1_000).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_unknown_and_disabled_are_indistinguishable() {
        let svc = service(store_with_user(UserStatus::Disabled));
        let disabled = svc.login_at("admin", "s3cret", 1_000).await.unwrap_err();
        let unknown = svc.login_at("nobody", "s3cret", 1_000).await.unwrap_err();

        assert_eq!(disabled.code(), unknown.code());
        assert!(matches!(disabled, AuthError::UserNotFound));
        assert!(matches!(unknown, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_refresh_refuses_disabled_account() {
        let svc = service(store_with_user(UserStatus::Disabled));
        let err = svc.refresh_at(1, 1_000).await.unwrap_err();
        assert!(matches!(err, AuthError::UserNotFound));
    }

    #[tokio::test]
    async fn test_refresh_issues_fresh_window() {
        let svc = service(store_with_user(UserStatus::Enabled));
        let pair = svc.refresh_at(1, 5_000).await.unwrap();
        assert_eq!(pair.expires_at, 5_000 + 3_600);
    }
}
