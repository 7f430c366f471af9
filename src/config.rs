//! Authentication configuration
//!
//! Provides a builder-pattern configuration for the token service, session
//! middleware, and login flow. The configuration is an immutable value
//! constructed once at startup and injected into everything that needs it;
//! there is no process-global config.

use std::time::Duration;

use crate::error::Locale;
use crate::parse::parse_duration;

/// Configuration for admin session authentication.
///
/// Controls token signing and the sliding-refresh policy:
/// - Signing secret for HS256 token signatures (IA-5, SC-12)
/// - Header scheme prefix expected in `Authorization` (e.g. `Bearer`)
/// - Access-token time-to-live
/// - Refresh threshold: tokens closer to expiry than this are reissued
///   in-band; zero disables sliding refresh entirely
/// - Issuer and subject-type claim constants
/// - Locale for client-facing error messages
///
/// # Example
///
/// ```ignore
/// use portcullis::AuthConfig;
/// use std::time::Duration;
///
/// // Load from environment variables
/// let config = AuthConfig::from_env()?;
///
/// // Or build programmatically
/// let config = AuthConfig::builder()
///     .secret("a-long-random-signing-secret")
///     .token_ttl(Duration::from_secs(3600))
///     .refresh_threshold(Duration::from_secs(1800))
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Secret used for HS256 token signatures (IA-5)
    pub secret: String,

    /// Scheme prefix expected in the `Authorization` header.
    /// Also returned as `token_type` in the login response.
    pub header_scheme: String,

    /// Access-token time-to-live
    pub token_ttl: Duration,

    /// Sliding-refresh threshold (AC-12).
    /// A validated token with less than this much life left is reissued
    /// and surfaced via response headers. Zero disables sliding refresh.
    pub refresh_threshold: Duration,

    /// Issuer claim (`iss`) stamped into every token
    pub issuer: String,

    /// Subject-type claim (`sub`) expected on every admin token.
    /// Parsing rejects tokens whose subject-type differs.
    pub subject: String,

    /// Locale for client-facing error messages
    pub locale: Locale,
}

/// Configuration construction errors.
///
/// Only unrecoverable misconfiguration is surfaced here; callers are
/// expected to abort startup on these.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    /// No signing secret was provided
    #[error("signing secret is required (set AUTH_SECRET or call .secret())")]
    MissingSecret,
    /// The header scheme prefix is empty
    #[error("header scheme prefix must not be empty")]
    EmptyScheme,
    /// The token TTL is zero
    #[error("token TTL must be greater than zero")]
    ZeroTtl,
}

impl AuthConfig {
    /// Create a new builder for programmatic configuration.
    pub fn builder() -> AuthConfigBuilder {
        AuthConfigBuilder::default()
    }

    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `AUTH_SECRET`: signing secret (required)
    /// - `AUTH_HEADER_SCHEME`: scheme prefix (default: "Bearer")
    /// - `AUTH_TOKEN_TTL`: e.g., "1h", "3600s" (default: "1h")
    /// - `AUTH_REFRESH_THRESHOLD`: e.g., "30m", "0s" to disable (default: "30m")
    /// - `AUTH_ISSUER`: issuer claim (default: "portcullis")
    /// - `AUTH_SUBJECT`: subject-type claim (default: "admin")
    /// - `AUTH_LOCALE`: "en" or "zh-CN" (default: "en")
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Ok(secret) = std::env::var("AUTH_SECRET") {
            builder = builder.secret(secret);
        }
        if let Ok(scheme) = std::env::var("AUTH_HEADER_SCHEME") {
            builder = builder.header_scheme(scheme);
        }
        if let Ok(ttl) = std::env::var("AUTH_TOKEN_TTL") {
            builder = builder.token_ttl(parse_duration(&ttl));
        }
        if let Ok(threshold) = std::env::var("AUTH_REFRESH_THRESHOLD") {
            builder = builder.refresh_threshold(parse_duration(&threshold));
        }
        if let Ok(issuer) = std::env::var("AUTH_ISSUER") {
            builder = builder.issuer(issuer);
        }
        if let Ok(subject) = std::env::var("AUTH_SUBJECT") {
            builder = builder.subject(subject);
        }
        if let Ok(locale) = std::env::var("AUTH_LOCALE") {
            builder = builder.locale(Locale::from_str_loose(&locale));
        }

        builder.build()
    }

    /// Whether sliding refresh is enabled at all.
    pub fn sliding_refresh_enabled(&self) -> bool {
        !self.refresh_threshold.is_zero()
    }
}

/// Builder for [`AuthConfig`]
#[derive(Debug, Clone)]
pub struct AuthConfigBuilder {
    secret: Option<String>,
    header_scheme: String,
    token_ttl: Duration,
    refresh_threshold: Duration,
    issuer: String,
    subject: String,
    locale: Locale,
}

impl Default for AuthConfigBuilder {
    fn default() -> Self {
        Self {
            secret: None,
            header_scheme: "Bearer".to_string(),
            token_ttl: Duration::from_secs(60 * 60),
            refresh_threshold: Duration::from_secs(30 * 60),
            issuer: "portcullis".to_string(),
            subject: "admin".to_string(),
            locale: Locale::En,
        }
    }
}

impl AuthConfigBuilder {
    /// Set the signing secret (required)
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Set the `Authorization` scheme prefix
    pub fn header_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.header_scheme = scheme.into();
        self
    }

    /// Set the access-token time-to-live
    pub fn token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Set the sliding-refresh threshold; `Duration::ZERO` disables refresh
    pub fn refresh_threshold(mut self, threshold: Duration) -> Self {
        self.refresh_threshold = threshold;
        self
    }

    /// Set the issuer claim
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Set the subject-type claim
    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    /// Set the error-message locale
    pub fn locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    /// Build the configuration, validating required fields.
    pub fn build(self) -> Result<AuthConfig, ConfigError> {
        let secret = match self.secret {
            Some(s) if !s.is_empty() => s,
            _ => return Err(ConfigError::MissingSecret),
        };
        if self.header_scheme.trim().is_empty() {
            return Err(ConfigError::EmptyScheme);
        }
        if self.token_ttl.is_zero() {
            return Err(ConfigError::ZeroTtl);
        }

        Ok(AuthConfig {
            secret,
            header_scheme: self.header_scheme,
            token_ttl: self.token_ttl,
            refresh_threshold: self.refresh_threshold,
            issuer: self.issuer,
            subject: self.subject,
            locale: self.locale,
        })
    }
}
