//! # Application Constants
//!
//! Binding names, environment variable names, protocol limits and HTTP header
//! values shared across the orchestrator.
//!
//! ## Binding Names
//!
//! Constants for Cloudflare Worker bindings that must match wrangler.toml configuration.
//!
//! ## Environment
//!
//! Names of the vars and secrets the store identity is read from.
//!
//! ## Protocol Limits
//!
//! Values imposed by the S3 multipart protocol family.

/// Optional KV namespace holding tunables under the `config` key
pub const STORAGE_CONFIG_KV_NAME: &str = "STORAGE_CONFIG";

/// Object store host name (no scheme, no port)
pub const ENV_ENDPOINT: &str = "MINIO_ENDPOINT";
/// Object store port
pub const ENV_PORT: &str = "MINIO_PORT";
/// TLS switch; anything other than `false` means HTTPS
pub const ENV_USE_SSL: &str = "MINIO_USE_SSL";
/// Access key id of the configured identity
pub const ENV_ACCESS_KEY: &str = "MINIO_ACCESS_KEY";
/// Secret access key of the configured identity
pub const ENV_SECRET_KEY: &str = "MINIO_SECRET_KEY";
/// Target bucket
pub const ENV_BUCKET: &str = "MINIO_BUCKET";
/// Signing region
pub const ENV_REGION: &str = "MINIO_REGION";
/// HS256 secret for bearer tokens; when unset the multipart routes are open
pub const ENV_JWT_SECRET: &str = "JWT_SECRET";
/// Value for `Access-Control-Allow-Origin`
pub const ENV_CORS_ALLOW_ORIGIN: &str = "CORS_ALLOW_ORIGIN";

pub const DEFAULT_ENDPOINT: &str = "localhost";
pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_BUCKET: &str = "uploads";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Content type recorded on the object when the client does not declare one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Validity of a presigned part URL (1 hour)
pub const DEFAULT_PART_URL_TTL_SECS: u64 = 3_600;

/// Longest presign validity SigV4 accepts (7 days)
pub const MAX_PART_URL_TTL_SECS: u64 = 604_800;

/// Largest part number S3-compatible stores accept. Informational only: the
/// store enforces it, the orchestrator just forwards.
pub const MAX_PART_NUMBER: u32 = 10_000;

/// Name reported by the health endpoint
pub const SERVICE_NAME: &str = "lms-multipart-cf-workers";

/// Path prefix of the multipart routes
pub const MULTIPART_ROUTE_PREFIX: &str = "/api/multipart/";

/// CORS header for allowed methods
pub const CORS_ALLOW_METHODS: &str = "GET, POST, OPTIONS";

/// CORS header for allowed headers
pub const CORS_ALLOW_HEADERS: &str = "Content-Type, Authorization";
