//! Security Event Logging
//!
//! Provides structured logging for security-relevant events as required by
//! NIST SP 800-53 AU-2 (Audit Events), AU-3 (Content of Audit Records).
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::observability::SecurityEvent;
//! use portcullis::security_event;
//!
//! security_event!(
//!     SecurityEvent::AuthenticationSuccess,
//!     user_id = %user.id,
//!     "User authenticated successfully"
//! );
//!
//! security_event!(
//!     SecurityEvent::AuthenticationFailure,
//!     username = %username,
//!     reason = "invalid_password",
//!     "Authentication failed"
//! );
//! ```

use std::fmt;

/// Security event categories for audit logging.
///
/// These categories align with NIST SP 800-53 AU-2 auditable events.
/// Covers the session and authorization lifecycle this crate owns;
/// application-specific events should be defined in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityEvent {
    // Authentication events
    /// Successful login or token validation
    AuthenticationSuccess,
    /// Failed authentication attempt
    AuthenticationFailure,
    /// Sliding refresh issued a replacement token
    TokenRefreshed,
    /// Sliding refresh was attempted but refused
    TokenRefreshFailed,

    // Authorization events
    /// Access granted to a route
    AccessGranted,
    /// Access denied to a route
    AccessDenied,
}

impl SecurityEvent {
    /// Get the event category for filtering/grouping
    pub fn category(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess
            | Self::AuthenticationFailure
            | Self::TokenRefreshed
            | Self::TokenRefreshFailed => "authentication",

            Self::AccessGranted | Self::AccessDenied => "authorization",
        }
    }

    /// Get the severity level for the event
    pub fn severity(&self) -> Severity {
        match self {
            // High - security-relevant failures
            Self::AuthenticationFailure | Self::AccessDenied | Self::TokenRefreshFailed => {
                Severity::High
            }

            // Medium - important state changes
            Self::AuthenticationSuccess | Self::TokenRefreshed => Severity::Medium,

            // Low - routine operations
            Self::AccessGranted => Severity::Low,
        }
    }

    /// Get the event name as a string
    pub fn name(&self) -> &'static str {
        match self {
            Self::AuthenticationSuccess => "authentication_success",
            Self::AuthenticationFailure => "authentication_failure",
            Self::TokenRefreshed => "token_refreshed",
            Self::TokenRefreshFailed => "token_refresh_failed",
            Self::AccessGranted => "access_granted",
            Self::AccessDenied => "access_denied",
        }
    }
}

impl fmt::Display for SecurityEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Routine operations
    Low,
    /// Important state changes
    Medium,
    /// Security-relevant failures
    High,
    /// Immediate attention required
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Log a security event with structured fields.
///
/// This macro provides consistent formatting for security-relevant events
/// as required by NIST SP 800-53 AU-3 (Content of Audit Records).
///
/// # Required Fields
///
/// The macro automatically includes:
/// - `security_event`: Event type name
/// - `category`: Event category
/// - `severity`: Event severity level
///
/// # Examples
///
/// ```ignore
/// security_event!(
///     SecurityEvent::AuthenticationSuccess,
///     user_id = %user.id,
///     "User authenticated"
/// );
/// ```
#[macro_export]
macro_rules! security_event {
    ($event:expr, $($field:tt)*) => {{
        let event = $event;
        let severity = event.severity();
        let category = event.category();
        let event_name = event.name();

        match severity {
            $crate::observability::Severity::Critical => {
                ::tracing::error!(
                    security_event = event_name,
                    category = category,
                    severity = "critical",
                    $($field)*
                );
            }
            $crate::observability::Severity::High => {
                ::tracing::warn!(
                    security_event = event_name,
                    category = category,
                    severity = "high",
                    $($field)*
                );
            }
            $crate::observability::Severity::Medium => {
                ::tracing::info!(
                    security_event = event_name,
                    category = category,
                    severity = "medium",
                    $($field)*
                );
            }
            $crate::observability::Severity::Low => {
                ::tracing::debug!(
                    security_event = event_name,
                    category = category,
                    severity = "low",
                    $($field)*
                );
            }
        }
    }};
}

pub use security_event;
