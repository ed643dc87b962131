//! Handlers of the four multipart routes. Each one authenticates the
//! caller, decodes the body, and hands it to the orchestrator backed by the
//! configured S3 store.

use serde::de::DeserializeOwned;
use worker::*;

use crate::config::Config;
use crate::errors::AppResult;
use crate::logging::Logger;
use crate::middleware::{AuthMiddleware, ValidationMiddleware};
use crate::models::*;
use crate::orchestrator::UploadOrchestrator;
use crate::store::S3Store;

/// Authenticates the caller and decodes the request body.
async fn accept<T: DeserializeOwned>(
    req: &mut Request,
    config: &Config,
    logger: &Logger,
) -> AppResult<T> {
    AuthMiddleware::authenticate(req, config, logger)?;
    ValidationMiddleware::json_body(req).await
}

/// `POST /api/multipart/initiate`
pub async fn initiate(mut req: Request, config: &Config, logger: &Logger) -> AppResult<Response> {
    let body: InitiateRequest = accept(&mut req, config, logger).await?;
    let store = S3Store::new(config.store.clone());
    let session = UploadOrchestrator::new(&store, &config.tunables, logger)
        .initiate(body)
        .await?;
    Ok(Response::from_json(&session)?)
}

/// `POST /api/multipart/sign-part`
pub async fn sign_part(mut req: Request, config: &Config, logger: &Logger) -> AppResult<Response> {
    let body: SignPartRequest = accept(&mut req, config, logger).await?;
    let store = S3Store::new(config.store.clone());
    let signed = UploadOrchestrator::new(&store, &config.tunables, logger).authorize_part(body)?;
    Ok(Response::from_json(&signed)?)
}

/// `POST /api/multipart/complete`
pub async fn complete(mut req: Request, config: &Config, logger: &Logger) -> AppResult<Response> {
    let body: CompleteRequest = accept(&mut req, config, logger).await?;
    let store = S3Store::new(config.store.clone());
    let completed = UploadOrchestrator::new(&store, &config.tunables, logger)
        .complete(body)
        .await?;
    Ok(Response::from_json(&completed)?)
}

/// `POST /api/multipart/abort`
pub async fn abort(mut req: Request, config: &Config, logger: &Logger) -> AppResult<Response> {
    let body: AbortRequest = accept(&mut req, config, logger).await?;
    let store = S3Store::new(config.store.clone());
    let outcome = UploadOrchestrator::new(&store, &config.tunables, logger)
        .abort(body)
        .await?;
    Ok(Response::from_json(&AbortResponse::from(outcome))?)
}
