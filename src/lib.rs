//! # LMS Multipart Upload Orchestrator - Cloudflare Workers
//!
//! Coordinates direct-to-storage multipart uploads against an S3-compatible
//! object store. Clients send their bytes straight to the store using
//! presigned URLs; this Worker only starts sessions, authorizes parts, and
//! completes or aborts sessions.
//!
//! ## Architecture
//!
//! - **Router**: Routes incoming requests to appropriate handlers
//! - **Middleware**: CORS, identity gate and body validation
//! - **Handlers**: Bind HTTP requests to orchestrator operations
//! - **Orchestrator**: Validation, forwarding and error normalization
//! - **Store**: `ObjectStore` capability and its SigV4 S3 implementation
//! - **Models**: Request and response shapes
//!
//! ## Example Usage
//!
//! ```text
//! POST /api/multipart/initiate   {"key", "contentType"}           → {"uploadId", "bucket", "key"}
//! POST /api/multipart/sign-part  {"key", "uploadId", "partNumber"} → {"url", "expiresIn"}
//! POST /api/multipart/complete   {"key", "uploadId", "parts"}      → {"location", "bucket", "key"}
//! POST /api/multipart/abort      {"key", "uploadId"}               → {"aborted", "outcome"}
//! ```

use std::sync::{Arc, OnceLock};
use worker::*;

mod auth;
mod config;
mod constants;
mod errors;
mod handlers;
mod logging;
mod middleware;
mod models;
mod orchestrator;
mod router;
mod store;
mod utils;

use config::Config;
use logging::Logger;

static CONFIG_CACHE: OnceLock<Arc<Config>> = OnceLock::new();

/// Main entry point for the Cloudflare Worker.
///
/// 1. Sets up panic handling for better debugging
/// 2. Loads configuration once per isolate
/// 3. Delegates request routing to the router module
///
/// A configuration failure is answered with a JSON 500 rather than a
/// thrown exception.
#[event(fetch)]
pub async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    // Set up panic hook for better error reporting in development
    console_error_panic_hook::set_once();

    let config = match load_config(&env).await {
        Ok(config) => config,
        Err(err) => {
            Logger::new(utils::generate_request_id()).error(
                "Configuration could not be loaded",
                log_data!("error" => err.to_string()),
            );
            return err.to_response();
        }
    };

    router::handle_request(req, config).await
}

async fn load_config(env: &Env) -> errors::AppResult<Arc<Config>> {
    if let Some(config) = CONFIG_CACHE.get() {
        return Ok(config.clone());
    }

    let config = Arc::new(Config::load(env).await?);
    let _ = CONFIG_CACHE.set(config.clone());
    Ok(config)
}
