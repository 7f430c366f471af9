//! Error taxonomy for authentication and authorization outcomes
//!
//! Every client-facing failure maps to a stable machine-readable code, an
//! HTTP status, and a human message in the configured locale. Internal
//! detail (store errors, signing failures) is logged, never returned to
//! the client (SI-11).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

use crate::store::StoreError;
use crate::token::TokenError;

// ============================================================================
// Locale
// ============================================================================

/// Locale for client-facing error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    En,
    ZhCn,
}

impl Locale {
    /// Parse a locale tag, tolerating case and `_`/`-` variants.
    /// Unknown tags fall back to English.
    pub fn from_str_loose(s: &str) -> Self {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "zh-cn" | "zh" => Locale::ZhCn,
            _ => Locale::En,
        }
    }
}

// ============================================================================
// Error type
// ============================================================================

/// Authentication and authorization failures.
///
/// Variants that carry a `#[source]` wrap internal causes for logging;
/// the client only ever sees the stable code and localized message.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No valid session: token missing, malformed, expired, or rejected
    #[error("not authenticated")]
    NotAuthenticated,

    /// Login against an unknown *or disabled* account. The two cases are
    /// merged so callers cannot enumerate valid usernames (IA-5).
    #[error("user does not exist")]
    UserNotFound,

    /// Password did not verify against the stored hash
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Token signing failed
    #[error("token issuance failed")]
    TokenIssuance(#[source] TokenError),

    /// Credential store failed while resolving an identity
    #[error("user lookup failed")]
    UserLookupFailed(#[source] StoreError),

    /// Authenticated but not permitted for this operation (AC-3)
    #[error("permission denied")]
    PermissionDenied,

    /// Permission store unavailable; request fails closed
    #[error("store unavailable")]
    Store(#[source] StoreError),
}

impl AuthError {
    /// Stable machine-readable code. Part of the wire contract; never
    /// reworded.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::NotAuthenticated => "not_authenticated",
            AuthError::UserNotFound => "user_not_found",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::TokenIssuance(_) => "token_issuance_failed",
            AuthError::UserLookupFailed(_) => "user_lookup_failed",
            AuthError::PermissionDenied => "permission_denied",
            AuthError::Store(_) => "store_unavailable",
        }
    }

    /// HTTP status for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::TokenIssuance(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::UserLookupFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AuthError::PermissionDenied => StatusCode::FORBIDDEN,
            AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Human message in the given locale.
    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => match self {
                AuthError::NotAuthenticated => "Not logged in or session expired",
                AuthError::UserNotFound => "User does not exist",
                AuthError::InvalidCredentials => "Incorrect password",
                AuthError::TokenIssuance(_) => "Failed to issue token",
                AuthError::UserLookupFailed(_) => "Failed to look up user",
                AuthError::PermissionDenied => "Permission denied",
                AuthError::Store(_) => "Service temporarily unavailable",
            },
            Locale::ZhCn => match self {
                AuthError::NotAuthenticated => "未登录或登录已过期",
                AuthError::UserNotFound => "用户不存在",
                AuthError::InvalidCredentials => "用户密码错误",
                AuthError::TokenIssuance(_) => "生成Token失败",
                AuthError::UserLookupFailed(_) => "获取用户信息失败",
                AuthError::PermissionDenied => "没有操作权限",
                AuthError::Store(_) => "服务暂不可用",
            },
        }
    }

    /// Build the JSON response in the given locale.
    pub fn respond(&self, locale: Locale) -> Response {
        let body = ErrorBody {
            code: self.code(),
            message: self.message(locale),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// JSON error body: `{"code": "...", "message": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.respond(Locale::En)
    }
}
