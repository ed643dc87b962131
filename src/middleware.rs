//! # Middleware Components
//!
//! Cross-cutting request/response concerns of the orchestrator: CORS, the
//! identity gate, and request body validation.
//!
//! ## Middleware Types
//!
//! - **CORS Middleware**: Handles cross-origin request support
//! - **Auth Middleware**: Applies the configured identity gate
//! - **Validation Middleware**: Decodes JSON request bodies
//!
//! ## Usage Examples
//!
//! ```rust
//! // Handle CORS preflight
//! if req.method() == Method::Options {
//!     return CorsMiddleware::handle_preflight(&config);
//! }
//!
//! // Reject unauthenticated callers, then decode the body
//! let identity = AuthMiddleware::authenticate(&req, &config, &logger)?;
//! let body: InitiateRequest = ValidationMiddleware::json_body(&mut req).await?;
//! ```

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use worker::*;

use crate::auth::{Identity, IdentityGate, JwtGate, OpenGate, Verdict};
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::utils::cors_headers;

/// Middleware for handling Cross-Origin Resource Sharing (CORS) requests.
///
/// Browsers upload parts straight to the store, but the four orchestrator
/// calls come from the same web client, so every response carries the
/// configured CORS headers.
pub struct CorsMiddleware;

impl CorsMiddleware {
    /// Applies CORS headers to an existing response.
    ///
    /// # Example
    ///
    /// ```rust
    /// let response = Response::from_json(&data)?;
    /// let cors_response = CorsMiddleware::apply_headers(response, &config);
    /// ```
    pub fn apply_headers(response: Response, config: &Config) -> Response {
        response.with_headers(cors_headers(&config.cors_allow_origin))
    }

    /// Answers a CORS preflight (OPTIONS) request with `204 No Content`.
    pub fn handle_preflight(config: &Config) -> Result<Response> {
        Ok(Self::apply_headers(Response::empty()?.with_status(204), config))
    }
}

/// Middleware applying the identity gate to incoming requests.
pub struct AuthMiddleware;

impl AuthMiddleware {
    /// Picks the gate for the current configuration: bearer tokens when a
    /// JWT secret is configured, open access otherwise.
    pub fn gate(config: &Config) -> Box<dyn IdentityGate> {
        match &config.jwt_secret {
            Some(secret) => Box::new(JwtGate::new(secret)),
            None => Box::new(OpenGate),
        }
    }

    /// Resolves the caller's identity or rejects the request.
    ///
    /// # Errors
    ///
    /// - `Unauthorized`: the gate denied the request
    /// - `Worker`: the request headers could not be read
    pub fn authenticate(req: &Request, config: &Config, logger: &Logger) -> AppResult<Identity> {
        let authorization = req.headers().get("Authorization")?;
        let identity = Self::authorize(
            Self::gate(config).as_ref(),
            authorization.as_deref(),
            Utc::now(),
        )?;

        logger.info(
            "Request authorized",
            log_data!(
                "subject" => identity.subject,
                "role" => identity.role.as_ref().map(|role| role.as_str())
            ),
        );
        Ok(identity)
    }

    /// Turns a gate verdict into a result.
    pub fn authorize(
        gate: &dyn IdentityGate,
        authorization: Option<&str>,
        now: DateTime<Utc>,
    ) -> AppResult<Identity> {
        match gate.authorize(authorization, now) {
            Verdict::Permitted(identity) => Ok(identity),
            Verdict::Denied(reason) => Err(AppError::Unauthorized(reason)),
        }
    }
}

/// Middleware for validating request bodies.
///
/// Field-level validation is left to the orchestrator; this layer only
/// guarantees the body is a JSON object of the expected shape.
pub struct ValidationMiddleware;

impl ValidationMiddleware {
    /// Reads and decodes the JSON body of a request.
    ///
    /// # Errors
    ///
    /// - `InvalidRequest`: If the body is empty or not valid JSON
    /// - `Worker`: If the body could not be read
    ///
    /// # Example
    ///
    /// ```rust
    /// let body: AbortRequest = ValidationMiddleware::json_body(&mut req).await?;
    /// ```
    pub async fn json_body<T: DeserializeOwned>(req: &mut Request) -> AppResult<T> {
        let raw = req.text().await?;
        Self::parse_json_body(&raw)
    }

    /// Decodes a raw request body.
    pub fn parse_json_body<T: DeserializeOwned>(raw: &str) -> AppResult<T> {
        if raw.trim().is_empty() {
            return Err(AppError::InvalidRequest(
                "Request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_str(raw)
            .map_err(|_| AppError::InvalidRequest("Invalid JSON in request body".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CompleteRequest, InitiateRequest};

    #[test]
    fn open_gate_admits_requests_without_token() {
        let identity = AuthMiddleware::authorize(&OpenGate, None, Utc::now()).unwrap();
        assert_eq!(identity, Identity::anonymous());
    }

    #[test]
    fn denied_verdict_becomes_unauthorized() {
        let err = AuthMiddleware::authorize(&JwtGate::new("secret"), None, Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(reason) if reason == "missing bearer token"));
    }

    #[test]
    fn parse_json_body_decodes_request() {
        let req: InitiateRequest =
            ValidationMiddleware::parse_json_body(r#"{"key":"video.mp4"}"#).unwrap();
        assert_eq!(req.key.as_deref(), Some("video.mp4"));
        assert_eq!(req.content_type, None);
    }

    #[test]
    fn parse_json_body_rejects_garbage_and_empty_bodies() {
        for raw in ["", "   ", "{not json", "[1, 2"] {
            let err = ValidationMiddleware::parse_json_body::<CompleteRequest>(raw).unwrap_err();
            assert!(matches!(err, AppError::InvalidRequest(_)), "accepted {:?}", raw);
        }
    }

    #[test]
    fn parse_json_body_keeps_raw_parts() {
        let req: CompleteRequest = ValidationMiddleware::parse_json_body(
            r#"{"key":"k","uploadId":"u","parts":[{"partNumber":1,"eTag":"d1"}]}"#,
        )
        .unwrap();
        assert_eq!(req.upload_id.as_deref(), Some("u"));
        assert!(req.parts.unwrap().is_array());
    }
}
