//! # Handlers Module
//!
//! HTTP request handlers of the orchestrator. Handlers return
//! `AppResult<Response>`; this module turns errors into JSON responses and
//! attaches CORS headers to everything it sends back.

use std::sync::Arc;

use worker::*;

use crate::config::Config;
use crate::constants::SERVICE_NAME;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::middleware::CorsMiddleware;

pub mod multipart;

/// Dispatches the multipart routes.
pub async fn handle_multipart_routes(
    req: Request,
    config: Arc<Config>,
    logger: &Logger,
) -> Result<Response> {
    let method = req.method();
    let url = req.url()?;
    let path = url.path();

    let result = match (method, path) {
        (Method::Post, "/api/multipart/initiate") => {
            multipart::initiate(req, &config, logger).await
        }
        (Method::Post, "/api/multipart/sign-part") => {
            multipart::sign_part(req, &config, logger).await
        }
        (Method::Post, "/api/multipart/complete") => {
            multipart::complete(req, &config, logger).await
        }
        (Method::Post, "/api/multipart/abort") => multipart::abort(req, &config, logger).await,
        (method, path) => Err(AppError::NotFound(format!("{} {}", method, path))),
    };

    respond(result, &config, logger)
}

/// Renders a handler result, logging failures by severity.
fn respond(result: AppResult<Response>, config: &Config, logger: &Logger) -> Result<Response> {
    match result {
        Ok(response) => Ok(CorsMiddleware::apply_headers(response, config)),
        Err(app_error) => {
            let data = log_data!(
                "status" => app_error.status_code().as_u16(),
                "error" => app_error.to_string()
            );
            if app_error.is_client_error() {
                logger.warn("Request rejected", data);
            } else {
                logger.error("Request failed", data);
            }

            match app_error.to_response() {
                Ok(response) => Ok(CorsMiddleware::apply_headers(response, config)),
                Err(_) => Response::error("Internal Server Error", 500)
                    .map(|r| CorsMiddleware::apply_headers(r, config)),
            }
        }
    }
}

/// Provides a health check endpoint for monitoring and load balancer probes.
pub fn handle_health_check(config: &Config) -> Result<Response> {
    let response = Response::from_json(&serde_json::json!({
        "status": "healthy",
        "service": SERVICE_NAME,
        "bucket": config.store.bucket,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))?;
    Ok(CorsMiddleware::apply_headers(response, config))
}

/// Handles requests to unmatched routes with a 404 Not Found response.
pub fn handle_not_found(config: &Config, logger: &Logger, path: &str) -> Result<Response> {
    respond(Err(AppError::NotFound(path.to_string())), config, logger)
}
