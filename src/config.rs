//! # Configuration Management
//!
//! Configuration is assembled once per isolate, on the first request, and is
//! immutable afterwards.
//!
//! ## Configuration Sources
//!
//! 1. **Vars and secrets**: store endpoint, identity, bucket, region, JWT secret
//! 2. **KV storage**: optional tunables stored under the "config" key of the
//!    `STORAGE_CONFIG` namespace
//! 3. **Defaults**: fallback values for anything not provided
//!
//! ## Example
//!
//! ```rust
//! let config = Config::load(&env).await?;
//! println!("Bucket: {}", config.store.bucket);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use worker::Env;

use crate::constants::*;
use crate::errors::{AppError, AppResult};

/// Connection settings and identity for the S3-compatible store.
#[derive(Clone, PartialEq)]
pub struct StoreConfig {
    /// Host name without scheme or port.
    pub endpoint: String,
    pub port: u16,
    pub use_ssl: bool,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

impl StoreConfig {
    /// Base URL of the store. Default ports are omitted so the URL host
    /// matches the `host` value that gets signed.
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme(), self.host())
    }

    pub fn scheme(&self) -> &'static str {
        if self.use_ssl {
            "https"
        } else {
            "http"
        }
    }

    /// Value of the HTTP `host` header for requests to the store.
    pub fn host(&self) -> String {
        let default_port = if self.use_ssl { 443 } else { 80 };
        if self.port == default_port {
            self.endpoint.clone()
        } else {
            format!("{}:{}", self.endpoint, self.port)
        }
    }
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("port", &self.port)
            .field("use_ssl", &self.use_ssl)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[redacted]")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .finish()
    }
}

/// Tunables that may be overridden from KV.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Lifetime of a presigned part URL in seconds.
    pub part_url_ttl_secs: u64,

    /// Content type used when `initiate` is called without one.
    pub default_content_type: String,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            part_url_ttl_secs: DEFAULT_PART_URL_TTL_SECS,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
        }
    }
}

impl Tunables {
    fn validate(self) -> AppResult<Self> {
        if self.part_url_ttl_secs == 0 || self.part_url_ttl_secs > MAX_PART_URL_TTL_SECS {
            return Err(AppError::Config(format!(
                "part_url_ttl_secs must be between 1 and {}, got {}",
                MAX_PART_URL_TTL_SECS, self.part_url_ttl_secs
            )));
        }
        if self.default_content_type.trim().is_empty() {
            return Err(AppError::Config(
                "default_content_type must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Process-wide configuration of the orchestrator.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub store: StoreConfig,
    pub tunables: Tunables,
    /// HS256 secret for the identity gate. `None` leaves the routes open.
    pub jwt_secret: Option<String>,
    pub cors_allow_origin: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("store", &self.store)
            .field("tunables", &self.tunables)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[redacted]"))
            .field("cors_allow_origin", &self.cors_allow_origin)
            .finish()
    }
}

impl Config {
    /// Loads configuration from the Worker environment.
    ///
    /// Secrets take precedence over plain vars of the same name. Tunables
    /// come from KV when the `STORAGE_CONFIG` binding exists and holds a
    /// `config` entry; otherwise defaults are used.
    ///
    /// # Errors
    ///
    /// - Missing store identity or malformed values yield `AppError::Config`
    /// - KV access failures are propagated
    pub async fn load(env: &Env) -> AppResult<Self> {
        let tunables = match env.kv(STORAGE_CONFIG_KV_NAME) {
            Ok(kv) => kv
                .get("config")
                .json::<Tunables>()
                .await
                .map_err(|e| AppError::Config(format!("invalid tunables in KV: {:?}", e)))?,
            Err(_) => None,
        };

        Self::from_lookup(
            |name| {
                env.secret(name)
                    .or_else(|_| env.var(name))
                    .ok()
                    .map(|value| value.to_string())
            },
            tunables,
        )
    }

    /// Builds configuration from a name → value lookup.
    ///
    /// Split from [`Config::load`] so parsing does not depend on the
    /// Workers runtime.
    pub fn from_lookup<F>(lookup: F, tunables: Option<Tunables>) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |name: &str| {
            get(name).ok_or_else(|| AppError::Config(format!("{} is not set", name)))
        };

        let port = match get(ENV_PORT) {
            Some(raw) => raw
                .parse::<u16>()
                .ok()
                .filter(|p| *p > 0)
                .ok_or_else(|| AppError::Config(format!("{} is not a valid port: {}", ENV_PORT, raw)))?,
            None => DEFAULT_PORT,
        };

        let store = StoreConfig {
            endpoint: get(ENV_ENDPOINT).unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            port,
            use_ssl: get(ENV_USE_SSL).as_deref() != Some("false"),
            access_key: require(ENV_ACCESS_KEY)?,
            secret_key: require(ENV_SECRET_KEY)?,
            bucket: get(ENV_BUCKET).unwrap_or_else(|| DEFAULT_BUCKET.to_string()),
            region: get(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string()),
        };

        if store.endpoint.contains("://") || store.endpoint.contains('/') {
            return Err(AppError::Config(format!(
                "{} must be a bare host name, got {}",
                ENV_ENDPOINT, store.endpoint
            )));
        }

        Ok(Self {
            store,
            tunables: tunables.unwrap_or_default().validate()?,
            jwt_secret: get(ENV_JWT_SECRET),
            cors_allow_origin: get(ENV_CORS_ALLOW_ORIGIN).unwrap_or_else(|| "*".to_string()),
        })
    }
}
