//! # Utility Functions
//!
//! Request identifiers and CORS headers shared by the router and handlers.

use chrono::Utc;
use uuid::Uuid;
use worker::Headers;

use crate::constants::{CORS_ALLOW_HEADERS, CORS_ALLOW_METHODS};

/// Generates an identifier that ties together all log lines of one request.
///
/// # Returns
///
/// A string in the format `{timestamp_millis}-{uuid}`, sortable by arrival
/// time.
///
/// # Example
///
/// ```rust
/// let request_id = generate_request_id();
/// // Returns: "1705314600000-550e8400-e29b-41d4-a716-446655440000"
/// ```
pub fn generate_request_id() -> String {
    format!("{}-{}", Utc::now().timestamp_millis(), Uuid::new_v4())
}

/// Creates the CORS headers attached to every response.
///
/// # Arguments
///
/// * `allow_origin` - Value of `Access-Control-Allow-Origin`, taken from
///   configuration
///
/// `Authorization` is among the allowed headers so browsers may send bearer
/// tokens cross-origin.
pub fn cors_headers(allow_origin: &str) -> Headers {
    let headers = Headers::new();
    // header names and values are static ASCII
    let _ = headers.set("Access-Control-Allow-Origin", allow_origin);
    let _ = headers.set("Access-Control-Allow-Methods", CORS_ALLOW_METHODS);
    let _ = headers.set("Access-Control-Allow-Headers", CORS_ALLOW_HEADERS);
    headers
}
