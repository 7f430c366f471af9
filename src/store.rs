//! Collaborator contracts: credential and permission storage
//!
//! Persistence stays with the host application. This crate consumes two
//! async traits and ships in-memory implementations suitable for tests and
//! single-process deployments; implement the traits over Postgres, Redis,
//! or an existing user service for anything distributed.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::password::{verify_password, PasswordError};

// ============================================================================
// Data model
// ============================================================================

/// Account lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Enabled,
    Disabled,
}

/// An administrative account as the credential store sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminUser {
    pub id: u64,
    pub username: String,
    /// Argon2id PHC string; never a plaintext password
    pub password_hash: String,
    pub status: UserStatus,
    pub is_admin: bool,
    pub mobile: String,
    pub nickname: String,
    pub email: String,
}

impl AdminUser {
    /// Whether this account may authenticate or hold a live session.
    pub fn is_enabled(&self) -> bool {
        self.status == UserStatus::Enabled
    }

    /// Verify a plaintext password against this account's stored hash.
    pub fn verify_password(&self, plain: &str) -> Result<bool, PasswordError> {
        verify_password(plain, &self.password_hash)
    }
}

/// A route-permission rule: one `(method, route)` pair and its policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub id: u64,
    /// Human-readable rule name for admin tooling
    pub name: String,
    /// Exact route path, e.g. `/admin/users`; no pattern matching
    pub route: String,
    /// Uppercase HTTP method, e.g. `GET`
    pub method: String,
    /// Whether a valid session is required to pass this rule
    pub requires_auth: bool,
    /// Backend handler name, informational only
    pub func: String,
    /// Backend handler path, informational only
    pub func_path: String,
    pub desc: String,
    /// Display ordering for admin tooling
    pub sort: i32,
}

// ============================================================================
// Contracts
// ============================================================================

/// Store failures. All variants fail the request closed.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend unreachable or in a bad state
    #[error("store unavailable: {0}")]
    Unavailable(String),
    /// Insert would create a second rule for the same `(method, route)`
    #[error("a rule already exists for {method} {route}")]
    DuplicateRoute { method: String, route: String },
}

/// Source of admin account records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an account by login name. `Ok(None)` means no such account.
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError>;

    /// Look up an account by id. Used by sliding refresh to re-check the
    /// account before extending its session.
    async fn find_by_id(&self, id: u64) -> Result<Option<AdminUser>, StoreError>;
}

/// Source of route-permission rules.
#[async_trait]
pub trait PermissionStore: Send + Sync {
    /// Fetch the rule for an exact `(method, route)` pair, if one exists.
    async fn find_by_route(
        &self,
        method: &str,
        route: &str,
    ) -> Result<Option<PermissionRecord>, StoreError>;
}

// ============================================================================
// In-memory implementations
// ============================================================================

/// In-memory credential store keyed by username.
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, AdminUser>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an account, keyed by username.
    pub fn insert(&self, user: AdminUser) -> Result<(), StoreError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| StoreError::Unavailable("credential store lock poisoned".to_string()))?;
        users.insert(user.username.clone(), user);
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<AdminUser>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("credential store lock poisoned".to_string()))?;
        Ok(users.get(username).cloned())
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<AdminUser>, StoreError> {
        let users = self
            .users
            .read()
            .map_err(|_| StoreError::Unavailable("credential store lock poisoned".to_string()))?;
        Ok(users.values().find(|u| u.id == id).cloned())
    }
}

/// In-memory permission store keyed by `(method, route)`.
#[derive(Default)]
pub struct MemoryPermissionStore {
    rules: RwLock<HashMap<(String, String), PermissionRecord>>,
}

impl MemoryPermissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a rule, rejecting a duplicate `(method, route)` pair. Two
    /// rules for the same pair would make evaluation order-dependent.
    pub fn insert(&self, record: PermissionRecord) -> Result<(), StoreError> {
        let key = (record.method.clone(), record.route.clone());
        let mut rules = self
            .rules
            .write()
            .map_err(|_| StoreError::Unavailable("permission store lock poisoned".to_string()))?;
        if rules.contains_key(&key) {
            return Err(StoreError::DuplicateRoute {
                method: record.method,
                route: record.route,
            });
        }
        rules.insert(key, record);
        Ok(())
    }
}

#[async_trait]
impl PermissionStore for MemoryPermissionStore {
    async fn find_by_route(
        &self,
        method: &str,
        route: &str,
    ) -> Result<Option<PermissionRecord>, StoreError> {
        let rules = self
            .rules
            .read()
            .map_err(|_| StoreError::Unavailable("permission store lock poisoned".to_string()))?;
        Ok(rules.get(&(method.to_string(), route.to_string())).cloned())
    }
}
