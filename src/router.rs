//! # Request Routing and Dispatch
//!
//! Pattern-based dispatch on HTTP method and path.
//!
//! ## Supported Routes
//!
//! - `GET /health` - Health check endpoint
//! - `POST /api/multipart/initiate` - Start an upload session
//! - `POST /api/multipart/sign-part` - Presigned URL for one part
//! - `POST /api/multipart/complete` - Assemble the object from a manifest
//! - `POST /api/multipart/abort` - Discard the session
//! - `OPTIONS *` - CORS preflight requests

use std::sync::Arc;

use worker::*;

use crate::config::Config;
use crate::constants::MULTIPART_ROUTE_PREFIX;
use crate::handlers::*;
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::CorsMiddleware;
use crate::utils::generate_request_id;

/// Handles incoming HTTP requests and routes them to appropriate handlers.
///
/// # Request Flow
///
/// 1. **CORS Preflight**: Handles OPTIONS requests for cross-origin support
/// 2. **Request Logging**: Tags the request with a fresh request id
/// 3. **Pattern Matching**: Matches method and path against known routes
/// 4. **Handler Dispatch**: Delegates to the matching handler
///
/// # Example Request Flow
///
/// ```text
/// POST /api/multipart/complete
/// ↓
/// handle_request()
/// ↓
/// handle_multipart_routes()
/// ↓
/// UploadOrchestrator::complete() → S3Store
/// ```
pub async fn handle_request(req: Request, config: Arc<Config>) -> Result<Response> {
    // Handle CORS preflight requests early to avoid unnecessary processing
    if req.method() == Method::Options {
        return CorsMiddleware::handle_preflight(&config);
    }

    let logger = Logger::new(generate_request_id());
    let url = req.url()?;
    let path = url.path();
    let method = req.method();

    logger.info(
        "Routing request",
        log_data!("method" => method.to_string(), "path" => path),
    );

    match (method, path) {
        (Method::Get, "/health") => handle_health_check(&config),
        (_, path) if path.starts_with(MULTIPART_ROUTE_PREFIX) => {
            handle_multipart_routes(req, config, &logger).await
        }
        _ => handle_not_found(&config, &logger, path),
    }
}
