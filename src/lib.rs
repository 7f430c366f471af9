//! # Portcullis
//!
//! Admin session authentication and route-permission authorization for
//! Axum applications.
//!
//! This crate provides the security core of an admin backend: bearer-token
//! issuance and validation, sliding (near-expiry) token refresh, password
//! credential verification, and a data-driven permission model that gates
//! access to specific HTTP routes by method and path. Persistence, route
//! registration, and admin tooling stay with the host application: the
//! crate consumes a [`CredentialStore`] and a [`PermissionStore`] and
//! exposes middleware plus a login flow on top of them.
//!
//! ## Features
//!
//! - **Stateless tokens** (IA-2): HS256-signed JWTs carrying identity
//!   claims; validation never touches storage
//! - **Sliding refresh** (AC-12): tokens nearing expiry are reissued
//!   in-band via response headers, no extra round trip
//! - **Route permissions** (AC-3): exact-match `(method, route)` rules
//!   with a per-rule "requires authentication" flag. With this boolean
//!   gate every denial means "no valid session" and maps to 401;
//!   [`AuthError::PermissionDenied`] (403) is reserved for role checks the
//!   host application layers on top of the bound [`AdminIdentity`]
//! - **Enumeration-safe login** (IA-5): unknown and disabled accounts are
//!   indistinguishable to the caller
//! - **Audit logging** (AU-2, AU-3): structured security events via
//!   `tracing`
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use axum::{Router, routing::get};
//! use portcullis::{AdminGuard, AuthConfig, AuthState};
//!
//! let config = AuthConfig::builder()
//!     .secret("a-long-random-signing-secret")
//!     .build()?;
//!
//! let state = AuthState::new(config, credential_store, permission_store);
//!
//! let app = Router::new()
//!     .route("/admin/users", get(list_users))
//!     .with_admin_auth(state.clone())
//!     .merge(portcullis::login::router(state));
//! ```
//!
//! ## Known limitation: no revocation
//!
//! Token validation is stateless by design; there is no server-side session
//! table and no revocation list. A compromised token stays valid until its
//! natural expiry. Sliding refresh re-reads the credential store, so a
//! disabled or deleted account cannot *extend* its window, but it keeps the
//! remainder of the current one. If revocation is required, layer a
//! short-lived denylist keyed by token claims in front of
//! [`TokenService::parse`].

pub mod authorize;
pub mod claims;
pub mod config;
pub mod error;
pub mod login;
pub mod middleware;
pub mod observability;
mod parse;
pub mod password;
pub mod store;
pub mod token;

// Re-exports
pub use authorize::{authorize, route_conflict, AccessDecision};
pub use claims::AdminClaims;
pub use config::{AuthConfig, AuthConfigBuilder, ConfigError};
pub use error::{AuthError, Locale};
pub use login::{LoginService, TokenPair};
pub use middleware::{admin_auth_middleware, AdminGuard, AdminIdentity, AuthState};
pub use parse::parse_duration;
pub use store::{
    AdminUser, CredentialStore, MemoryCredentialStore, MemoryPermissionStore, PermissionRecord,
    PermissionStore, StoreError, UserStatus,
};
pub use token::{extract_bearer_token, unix_now, TokenError, TokenService};
