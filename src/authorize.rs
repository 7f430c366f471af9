//! Route-permission evaluation (AC-3)
//!
//! Access to a route is governed by at most one [`PermissionRecord`] per
//! exact `(method, route)` pair. Evaluation is split in two: a pure
//! function over the fetched record, and a store-backed wrapper the
//! middleware calls. The pure core keeps policy decisions testable without
//! a store.

use crate::security_event;
use crate::observability::SecurityEvent;
use crate::store::{PermissionRecord, PermissionStore, StoreError};

/// Outcome of evaluating a request against the permission table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// A rule exists and the request satisfies it
    Allowed,
    /// No rule exists for this `(method, route)`. The caller decides the
    /// policy; the session middleware fails closed and demands a valid
    /// session, so an unlisted route never becomes an anonymous bypass.
    NoRuleDefined,
    /// A rule exists and the request does not satisfy it
    Denied,
}

/// Evaluate a fetched rule against the request's authentication state.
pub fn evaluate(record: Option<&PermissionRecord>, authenticated: bool) -> AccessDecision {
    match record {
        None => AccessDecision::NoRuleDefined,
        Some(rule) if rule.requires_auth && !authenticated => AccessDecision::Denied,
        Some(_) => AccessDecision::Allowed,
    }
}

/// Fetch the rule for `(method, route)` and evaluate it.
pub async fn authorize(
    store: &dyn PermissionStore,
    method: &str,
    route: &str,
    authenticated: bool,
) -> Result<AccessDecision, StoreError> {
    let record = store.find_by_route(method, route).await?;
    let decision = evaluate(record.as_ref(), authenticated);
    log_access_decision(decision, method, route, authenticated);
    Ok(decision)
}

/// Whether a rule already exists for `(method, route)`.
///
/// Rule-authoring surfaces call this before inserting so a duplicate is
/// reported as a validation failure rather than a store error.
pub async fn route_conflict(
    store: &dyn PermissionStore,
    method: &str,
    route: &str,
) -> Result<bool, StoreError> {
    Ok(store.find_by_route(method, route).await?.is_some())
}

fn log_access_decision(decision: AccessDecision, method: &str, route: &str, authenticated: bool) {
    match decision {
        AccessDecision::Allowed => {
            security_event!(
                SecurityEvent::AccessGranted,
                method = %method,
                route = %route,
                authenticated = authenticated,
                "Route access granted"
            );
        }
        AccessDecision::NoRuleDefined => {
            security_event!(
                SecurityEvent::AccessDenied,
                method = %method,
                route = %route,
                authenticated = authenticated,
                reason = "no_rule_defined",
                "No permission rule for route"
            );
        }
        AccessDecision::Denied => {
            security_event!(
                SecurityEvent::AccessDenied,
                method = %method,
                route = %route,
                authenticated = authenticated,
                reason = "authentication_required",
                "Route access denied"
            );
        }
    }
}
