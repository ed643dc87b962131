//! # Upload Session Orchestrator
//!
//! Mediates a client's direct multipart upload to the object store. The
//! orchestrator validates requests, forwards them, and normalizes failures;
//! it never sees payload bytes and keeps no session state. The store is the
//! only source of truth, so a call against a completed or aborted session is
//! rejected by the store and that rejection is passed on unchanged.
//!
//! ## Upload Lifecycle
//!
//! ```text
//! 1. initiate      → store issues an upload id
//! 2. authorizePart → presigned PUT URL per chunk (no store round trip)
//! 3. client PUTs chunks straight to the store, collects ETags
//! 4. complete      → manifest forwarded, store assembles the object
//!    or abort      → store discards the parts
//! ```

use std::time::Duration;

use crate::config::Tunables;
use crate::constants::MAX_PART_NUMBER;
use crate::errors::{AppError, AppResult};
use crate::log_data;
use crate::logging::Logger;
use crate::models::*;
use crate::store::{CompletedPart, ObjectStore, StoreError};

pub struct UploadOrchestrator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    part_url_ttl: Duration,
    default_content_type: &'a str,
    logger: &'a Logger,
}

impl<'a, S: ObjectStore + ?Sized> UploadOrchestrator<'a, S> {
    pub fn new(store: &'a S, tunables: &'a Tunables, logger: &'a Logger) -> Self {
        Self {
            store,
            part_url_ttl: Duration::from_secs(tunables.part_url_ttl_secs),
            default_content_type: &tunables.default_content_type,
            logger,
        }
    }

    /// Starts a session for `key` and returns the store-issued upload id.
    pub async fn initiate(&self, request: InitiateRequest) -> AppResult<InitiateResponse> {
        let key = required(request.key, "key")?;
        let content_type = request
            .content_type
            .map(|ct| ct.trim().to_string())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| self.default_content_type.to_string());

        let upload_id = self
            .store
            .create_multipart_upload(&key, &content_type)
            .await
            .map_err(|e| self.upstream("initiate multipart upload", &key, None, e))?;

        if upload_id.is_empty() {
            self.logger.error(
                "Object store returned an empty upload id",
                log_data!("key" => key),
            );
            return Err(AppError::Upstream {
                operation: "initiate multipart upload",
                message: "object store returned an empty upload id".to_string(),
            });
        }

        self.logger.info(
            "Multipart upload initiated",
            log_data!(
                "key" => key,
                "upload_id" => upload_id,
                "content_type" => content_type,
                "state" => SessionState::Initiated
            ),
        );

        Ok(InitiateResponse {
            upload_id,
            bucket: self.store.bucket().to_string(),
            key,
        })
    }

    /// Issues a time-bounded URL for uploading one part directly to the store.
    pub fn authorize_part(&self, request: SignPartRequest) -> AppResult<SignPartResponse> {
        let key = required(request.key, "key")?;
        let upload_id = required(request.upload_id, "uploadId")?;
        let part_number = request
            .part_number
            .as_ref()
            .and_then(parse_part_number)
            .ok_or_else(|| {
                AppError::InvalidRequest("partNumber must be a positive integer".to_string())
            })?;

        if part_number > MAX_PART_NUMBER {
            // the store has the final word on the range
            self.logger.warn(
                "Part number above the usual store limit",
                log_data!("key" => key, "upload_id" => upload_id, "part_number" => part_number),
            );
        }

        let url = self
            .store
            .presign_upload_part(&key, &upload_id, part_number, self.part_url_ttl)
            .map_err(|e| self.upstream("sign upload part", &key, Some(&upload_id), e))?;

        Ok(SignPartResponse {
            url,
            expires_in: self.part_url_ttl.as_secs(),
        })
    }

    /// Assembles the object from the client's manifest.
    ///
    /// Malformed manifest entries are dropped rather than failing the whole
    /// request; the remaining parts may still be enough for the store.
    pub async fn complete(&self, request: CompleteRequest) -> AppResult<CompleteResponse> {
        let key = required(request.key, "key")?;
        let upload_id = required(request.upload_id, "uploadId")?;
        let entries = match request.parts {
            Some(serde_json::Value::Array(entries)) => entries,
            _ => {
                return Err(AppError::InvalidRequest(
                    "parts must be a non-empty array".to_string(),
                ))
            }
        };

        let mut parts: Vec<CompletedPart> = entries.iter().filter_map(manifest_part).collect();
        let dropped = entries.len() - parts.len();
        if dropped > 0 {
            self.logger.warn(
                "Dropped malformed manifest entries",
                log_data!("key" => key, "upload_id" => upload_id, "dropped" => dropped, "kept" => parts.len()),
            );
        }
        if parts.is_empty() {
            return Err(AppError::InvalidRequest(
                "parts must contain at least one entry with partNumber and eTag".to_string(),
            ));
        }
        parts.sort_by_key(|part| part.part_number);

        let completed = self
            .store
            .complete_multipart_upload(&key, &upload_id, &parts)
            .await
            .map_err(|e| self.upstream("complete multipart upload", &key, Some(&upload_id), e))?;

        self.logger.info(
            "Multipart upload completed",
            log_data!(
                "key" => key,
                "upload_id" => upload_id,
                "parts" => parts.len(),
                "etag" => completed.etag,
                "state" => SessionState::Completed
            ),
        );

        Ok(CompleteResponse {
            location: completed.location,
            bucket: self.store.bucket().to_string(),
            key,
        })
    }

    /// Discards the session. A session the store no longer knows is treated
    /// as already aborted.
    pub async fn abort(&self, request: AbortRequest) -> AppResult<AbortOutcome> {
        let key = required(request.key, "key")?;
        let upload_id = required(request.upload_id, "uploadId")?;

        let outcome = match self.store.abort_multipart_upload(&key, &upload_id).await {
            Ok(()) => AbortOutcome::Aborted,
            Err(e) if e.is_no_such_upload() => AbortOutcome::AlreadyGone,
            Err(e) => return Err(self.upstream("abort multipart upload", &key, Some(&upload_id), e)),
        };

        self.logger.info(
            "Multipart upload aborted",
            log_data!(
                "key" => key,
                "upload_id" => upload_id,
                "outcome" => outcome,
                "state" => SessionState::Aborted
            ),
        );
        Ok(outcome)
    }

    /// Logs a store failure and classifies it for the caller.
    fn upstream(
        &self,
        operation: &'static str,
        key: &str,
        upload_id: Option<&str>,
        error: StoreError,
    ) -> AppError {
        self.logger.error(
            "Object store call failed",
            log_data!(
                "operation" => operation,
                "key" => key,
                "upload_id" => upload_id,
                "store_code" => error.code(),
                "error" => error.to_string()
            ),
        );

        if error.is_caller_mistake() {
            AppError::InvalidRequest(format!("{} rejected by object store: {}", operation, error))
        } else {
            AppError::Upstream {
                operation,
                message: error.to_string(),
            }
        }
    }
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::InvalidRequest(format!("{} is required", field)))
}
