//! Admin session middleware (IA-2, AC-3, AC-12)
//!
//! One middleware guards the whole admin surface. Per request it:
//!
//! 1. Reads the clock once; every time comparison in the request uses
//!    that instant
//! 2. Extracts and validates the bearer token, if one was presented
//! 3. Evaluates the route-permission rule for `(method, path)`; routes
//!    with `requires_auth = false` pass without a session, routes with no
//!    rule fail closed and demand one
//! 4. Binds the validated identity to the request as an [`AdminIdentity`]
//!    extension
//! 5. If the token is inside the refresh window, re-checks the account
//!    and attaches a replacement token to the response headers
//!
//! Rejections short-circuit with the JSON error body; they never reach
//! the inner handler.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::{HeaderValue, AUTHORIZATION};
use axum::middleware::Next;
use axum::response::Response;
use axum::Router;

use crate::authorize::{authorize, AccessDecision};
use crate::claims::AdminClaims;
use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::login::LoginService;
use crate::observability::SecurityEvent;
use crate::security_event;
use crate::store::{CredentialStore, PermissionStore};
use crate::token::{extract_bearer_token, unix_now, TokenError, TokenService};

/// Response header carrying a replacement access token.
pub const REFRESH_TOKEN_HEADER: &str = "refresh-access-token";
/// Response header carrying the replacement token's expiry (Unix seconds).
pub const REFRESH_EXP_HEADER: &str = "refresh-exp";

/// Shared state for the session middleware and login flow.
#[derive(Clone)]
pub struct AuthState {
    pub config: Arc<AuthConfig>,
    pub tokens: TokenService,
    pub credentials: Arc<dyn CredentialStore>,
    pub permissions: Arc<dyn PermissionStore>,
}

impl AuthState {
    pub fn new(
        config: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        permissions: Arc<dyn PermissionStore>,
    ) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            config: Arc::new(config),
            tokens,
            credentials,
            permissions,
        }
    }

    /// Login service wired to this state's token service and stores.
    pub fn login_service(&self) -> LoginService {
        LoginService::new(
            self.tokens.clone(),
            Arc::clone(&self.credentials),
            self.config.header_scheme.clone(),
        )
    }
}

/// Identity bound to the request by the middleware.
///
/// Handlers behind the middleware extract it with
/// `Extension<AdminIdentity>`. Present only when the request carried a
/// valid token; on `requires_auth = false` routes hit anonymously there is
/// no extension.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminIdentity {
    pub user_id: u64,
    pub mobile: String,
    pub nickname: String,
    pub email: String,
}

impl From<&AdminClaims> for AdminIdentity {
    fn from(claims: &AdminClaims) -> Self {
        Self {
            user_id: claims.user_id,
            mobile: claims.mobile.clone(),
            nickname: claims.nickname.clone(),
            email: claims.email.clone(),
        }
    }
}

/// The session middleware. Apply via [`AdminGuard::with_admin_auth`] or
/// `axum::middleware::from_fn_with_state`.
pub async fn admin_auth_middleware(
    State(state): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    let locale = state.config.locale;
    let now = unix_now();
    let method = request.method().as_str().to_string();
    let path = request.uri().path().to_string();

    // Validate the token if one was presented. A missing token is not yet
    // a failure: the route's permission rule decides whether one is needed.
    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| extract_bearer_token(v, &state.config.header_scheme))
        .map(str::to_owned);

    let claims = match bearer {
        Some(token) => match state.tokens.parse_at(&token, now) {
            Ok(claims) => Some(claims),
            Err(err) => {
                security_event!(
                    SecurityEvent::AuthenticationFailure,
                    method = %method,
                    path = %path,
                    reason = token_reject_reason(&err),
                    "Token rejected"
                );
                None
            }
        },
        None => None,
    };
    let authenticated = claims.is_some();

    let decision = match authorize(state.permissions.as_ref(), &method, &path, authenticated).await
    {
        Ok(d) => d,
        Err(e) => return AuthError::Store(e).respond(locale),
    };
    match decision {
        AccessDecision::Allowed => {}
        // No rule: fail closed, a valid session is required
        AccessDecision::NoRuleDefined | AccessDecision::Denied => {
            if !authenticated {
                return AuthError::NotAuthenticated.respond(locale);
            }
        }
    }

    // Identity binding and sliding refresh only apply to real sessions
    let mut refreshed = None;
    if let Some(claims) = &claims {
        request.extensions_mut().insert(AdminIdentity::from(claims));

        if state.config.sliding_refresh_enabled()
            && claims.remaining(now) < state.config.refresh_threshold.as_secs() as i64
        {
            refreshed = sliding_refresh(&state, claims, now).await;
        }
    }

    let mut response = next.run(request).await;

    if let Some((token, exp)) = refreshed {
        attach_refresh_headers(&mut response, &token, exp);
    }
    response
}

/// Re-check the account and mint a replacement token.
///
/// Any failure here is non-fatal: the current token is still valid, so the
/// request proceeds and the session simply does not get extended.
async fn sliding_refresh(
    state: &AuthState,
    claims: &AdminClaims,
    now: i64,
) -> Option<(String, i64)> {
    let user = match state.credentials.find_by_id(claims.user_id).await {
        Ok(Some(user)) if user.is_enabled() => user,
        Ok(_) => {
            security_event!(
                SecurityEvent::TokenRefreshFailed,
                user_id = %claims.user_id,
                reason = "unknown_or_disabled",
                "Sliding refresh refused"
            );
            return None;
        }
        Err(e) => {
            security_event!(
                SecurityEvent::TokenRefreshFailed,
                user_id = %claims.user_id,
                reason = "store_error",
                error = %e,
                "Sliding refresh failed"
            );
            return None;
        }
    };

    match state.tokens.refresh(&user, now) {
        Ok((token, new_claims)) => {
            security_event!(
                SecurityEvent::TokenRefreshed,
                user_id = %user.id,
                expires_at = new_claims.exp,
                "Sliding refresh issued"
            );
            Some((token, new_claims.exp))
        }
        Err(e) => {
            security_event!(
                SecurityEvent::TokenRefreshFailed,
                user_id = %user.id,
                reason = "issuance_error",
                error = %e,
                "Sliding refresh failed"
            );
            None
        }
    }
}

fn attach_refresh_headers(response: &mut Response, token: &str, exp: i64) {
    // A signed compact token is always ASCII; a failure here means the
    // token is unusable as a header value and is dropped, not served
    if let Ok(value) = HeaderValue::from_str(token) {
        response.headers_mut().insert(REFRESH_TOKEN_HEADER, value);
        if let Ok(exp_value) = HeaderValue::from_str(&exp.to_string()) {
            response.headers_mut().insert(REFRESH_EXP_HEADER, exp_value);
        }
    }
}

fn token_reject_reason(err: &TokenError) -> &'static str {
    match err {
        TokenError::Expired => "expired",
        TokenError::InvalidClaims => "invalid_claims",
        TokenError::Invalid => "invalid",
        TokenError::Signing(_) => "signing",
    }
}

/// Extension trait applying the session middleware to a router.
pub trait AdminGuard {
    /// Guard every route in this router with [`admin_auth_middleware`].
    fn with_admin_auth(self, state: AuthState) -> Self;
}

impl<S> AdminGuard for Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn with_admin_auth(self, state: AuthState) -> Self {
        self.layer(axum::middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::routing::get;
    use axum::Extension;
    use http_body_util::BodyExt;
    use std::time::Duration;
    use tower::ServiceExt;

    use crate::password::hash_password;
    use crate::store::{
        AdminUser, MemoryCredentialStore, MemoryPermissionStore, PermissionRecord, UserStatus,
    };

    fn permission(method: &str, route: &str, requires_auth: bool) -> PermissionRecord {
        PermissionRecord {
            id: 0,
            name: route.to_string(),
            route: route.to_string(),
            method: method.to_string(),
            requires_auth,
            func: String::new(),
            func_path: String::new(),
            desc: String::new(),
            sort: 0,
        }
    }

    fn test_user() -> AdminUser {
        AdminUser {
            id: 9,
            username: "admin".to_string(),
            password_hash: hash_password("pw").unwrap(),
            status: UserStatus::Enabled,
            is_admin: true,
            mobile: "13800000000".to_string(),
            nickname: "Admin".to_string(),
            email: "admin@example.com".to_string(),
        }
    }

    fn build_state(token_ttl: Duration, refresh_threshold: Duration) -> AuthState {
        let config = AuthConfig::builder()
            .secret("middleware-test-secret")
            .token_ttl(token_ttl)
            .refresh_threshold(refresh_threshold)
            .build()
            .unwrap();

        let credentials = MemoryCredentialStore::new();
        credentials.insert(test_user()).unwrap();

        let permissions = MemoryPermissionStore::new();
        permissions
            .insert(permission("GET", "/admin/users", true))
            .unwrap();
        permissions
            .insert(permission("GET", "/public/status", false))
            .unwrap();

        AuthState::new(config, Arc::new(credentials), Arc::new(permissions))
    }

    fn app(state: AuthState) -> Router {
        async fn whoami(identity: Option<Extension<AdminIdentity>>) -> String {
            match identity {
                Some(Extension(id)) => format!("user:{}", id.user_id),
                None => "anonymous".to_string(),
            }
        }

        Router::new()
            .route("/admin/users", get(whoami))
            .route("/public/status", get(whoami))
            .route("/unlisted", get(whoami))
            .with_admin_auth(state)
    }

    fn bearer(state: &AuthState, now: i64) -> String {
        let claims = state.tokens.claims_for(&test_user(), now);
        format!("Bearer {}", state.tokens.issue(&claims).unwrap())
    }

    async fn send(app: Router, path: &str, auth: Option<&str>) -> Response {
        let mut req = HttpRequest::builder().uri(path).method("GET");
        if let Some(value) = auth {
            req = req.header(AUTHORIZATION, value);
        }
        app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_public_route_reachable_without_token() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let response = send(app(state), "/public/status", None).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_protected_route_rejects_missing_token() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let response = send(app(state), "/admin/users", None).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["code"], "not_authenticated");
        assert_eq!(body["message"], "Not logged in or session expired");
    }

    #[tokio::test]
    async fn test_protected_route_rejects_garbage_token() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let response = send(app(state), "/admin/users", Some("Bearer not.a.token")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_protected_route_binds_identity() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let token = bearer(&state, unix_now());
        let response = send(app(state), "/admin/users", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "user:9");
    }

    #[tokio::test]
    async fn test_unlisted_route_fails_closed() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let response = send(app(state.clone()), "/unlisted", None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // With a valid session the unlisted route is reachable
        let token = bearer(&state, unix_now());
        let response = send(app(state), "/unlisted", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_identity_bound_on_public_route_with_token() {
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(1800));
        let token = bearer(&state, unix_now());
        let response = send(app(state), "/public/status", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_string(response).await, "user:9");
    }

    #[tokio::test]
    async fn test_sliding_refresh_attaches_headers() {
        // TTL shorter than the threshold: every fresh token is already
        // inside the refresh window
        let state = build_state(Duration::from_secs(60), Duration::from_secs(1800));
        let sent_at = unix_now();
        let token = bearer(&state, sent_at);
        let response = send(app(state.clone()), "/admin/users", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let new_token = response
            .headers()
            .get(REFRESH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let new_exp: i64 = response
            .headers()
            .get(REFRESH_EXP_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .unwrap();

        // The replacement expires one TTL from validation time
        let drift = new_exp - (sent_at + 60);
        assert!((0..=2).contains(&drift), "drift was: {drift}");

        // The replacement token parses and expires at the advertised time
        let parsed = state.tokens.parse(&new_token.unwrap()).unwrap();
        assert_eq!(parsed.exp, new_exp);
        assert_eq!(parsed.user_id, 9);
    }

    #[tokio::test]
    async fn test_no_refresh_outside_window() {
        // Long TTL, small threshold: a fresh token is nowhere near expiry
        let state = build_state(Duration::from_secs(3600), Duration::from_secs(10));
        let token = bearer(&state, unix_now());
        let response = send(app(state), "/admin/users", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REFRESH_TOKEN_HEADER).is_none());
        assert!(response.headers().get(REFRESH_EXP_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_zero_threshold_disables_refresh() {
        let state = build_state(Duration::from_secs(60), Duration::ZERO);
        let token = bearer(&state, unix_now());
        let response = send(app(state), "/admin/users", Some(&token)).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REFRESH_TOKEN_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_refresh_refused_for_disabled_account() {
        let state = build_state(Duration::from_secs(60), Duration::from_secs(1800));
        let token = bearer(&state, unix_now());

        // Disable the account after the token was issued
        let credentials = MemoryCredentialStore::new();
        let mut user = test_user();
        user.status = UserStatus::Disabled;
        credentials.insert(user).unwrap();
        let state = AuthState::new(
            AuthConfig::builder()
                .secret("middleware-test-secret")
                .token_ttl(Duration::from_secs(60))
                .refresh_threshold(Duration::from_secs(1800))
                .build()
                .unwrap(),
            Arc::new(credentials),
            Arc::clone(&state.permissions),
        );

        // The current token still works, but the session is not extended
        let response = send(app(state), "/admin/users", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(REFRESH_TOKEN_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_expired_token_rejected() {
        let state = build_state(Duration::from_secs(60), Duration::from_secs(1800));
        // Issued far enough in the past to be expired now
        let token = bearer(&state, unix_now() - 120);
        let response = send(app(state), "/admin/users", Some(&token)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
