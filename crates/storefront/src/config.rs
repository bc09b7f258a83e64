//! Storefront engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPEASE_API_BASE_URL` - Base URL of the order/cart/wishlist service
//!   (e.g., `https://shop.example.com/api/`)
//! - `SHOPEASE_ACCESS_TOKEN` - Bearer token for the signed-in customer
//!
//! ## Optional
//! - `SHOPEASE_REQUEST_TIMEOUT_SECS` - Transport timeout per request (default: none)
//! - `SHOPEASE_ORDER_CACHE_TTL_SECS` - TTL for retrieved orders (default: 600)
//! - `SHOPEASE_MUTATION_POLICY` - `serialized` (default) or `concurrent`

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::mutator::MutationPolicy;

const DEFAULT_ORDER_CACHE_TTL_SECS: u64 = 10 * 60;
const MIN_ACCESS_TOKEN_LENGTH: usize = 16;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Remote service configuration
    pub api: ApiConfig,
    /// How overlapping mutations of one resource kind are scheduled
    pub mutation_policy: MutationPolicy,
}

/// Remote service configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative paths join beneath it
    pub base_url: Url,
    /// Bearer token sent with every request
    pub access_token: SecretString,
    /// Transport timeout per request; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// How long a retrieved order stays cached
    pub order_cache_ttl: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[REDACTED]")
            .field("request_timeout", &self.request_timeout)
            .field("order_cache_ttl", &self.order_cache_ttl)
            .finish()
    }
}

impl ApiConfig {
    /// Configuration for `base_url` with defaults for everything optional.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` cannot be parsed.
    pub fn new(base_url: &str, access_token: SecretString) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("SHOPEASE_API_BASE_URL", base_url)?,
            access_token,
            request_timeout: None,
            order_cache_ttl: Duration::from_secs(DEFAULT_ORDER_CACHE_TTL_SECS),
        })
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the access token looks like a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = get_required(&lookup, "SHOPEASE_API_BASE_URL")?;
        let access_token = get_validated_secret(&lookup, "SHOPEASE_ACCESS_TOKEN")?;

        let mut api = ApiConfig::new(&base_url, access_token)?;
        api.request_timeout =
            get_optional_secs(&lookup, "SHOPEASE_REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);
        if let Some(ttl) = get_optional_secs(&lookup, "SHOPEASE_ORDER_CACHE_TTL_SECS")? {
            api.order_cache_ttl = Duration::from_secs(ttl);
        }

        let mutation_policy = match lookup("SHOPEASE_MUTATION_POLICY") {
            Some(raw) => raw.parse::<MutationPolicy>().map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPEASE_MUTATION_POLICY".to_string(), e)
            })?,
            None => MutationPolicy::default(),
        };

        Ok(Self {
            api,
            mutation_policy,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required variable.
fn get_required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional whole number of seconds.
fn get_optional_secs(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<u64>, ConfigError> {
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
        })
        .transpose()
}

/// Parse a base URL, appending the trailing slash `Url::join` needs.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute http(s) URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Validate that a token is not a placeholder and is long enough to be real.
fn validate_token_strength(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = token.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    if token.len() < MIN_ACCESS_TOKEN_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {MIN_ACCESS_TOKEN_LENGTH} characters (got {})",
                token.len()
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret.
fn get_validated_secret(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<SecretString, ConfigError> {
    let secret = SecretString::from(get_required(lookup, key)?);
    validate_token_strength(secret.expose_secret(), key)?;
    Ok(secret)
}
