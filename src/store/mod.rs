//! # Object Store Capability
//!
//! The orchestrator talks to storage only through [`ObjectStore`], which
//! covers the four calls of the S3 multipart protocol family. Any store that
//! speaks that protocol can be plugged in.
//!
//! ## Implementations
//!
//! - [`S3Store`]: path-style S3 REST over the Workers fetch API
//! - `MemoryStore`: in-process store used by the test suite

use std::time::Duration;

use async_trait::async_trait;

mod error;
#[cfg(test)]
pub mod memory;
pub mod s3;
pub mod sigv4;
mod xml;

pub use error::{StoreError, StoreResult};
pub use s3::S3Store;

/// One `(partNumber, ETag)` entry of a completion manifest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedPart {
    pub part_number: u32,
    pub etag: String,
}

/// Result of a successful completion.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletedObject {
    pub location: String,
    pub etag: Option<String>,
}

/// Capability interface over an S3-compatible multipart store.
///
/// Futures are not `Send`: inside a Worker every request runs on a single
/// JS thread and fetch futures hold JS values.
#[async_trait(?Send)]
pub trait ObjectStore {
    /// Bucket all calls operate on.
    fn bucket(&self) -> &str;

    /// Starts a multipart upload and returns the store-issued upload id.
    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StoreResult<String>;

    /// Returns a URL allowing exactly one `PUT` of `part_number` until it
    /// expires. Pure computation, no round trip.
    fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        expires_in: Duration,
    ) -> StoreResult<String>;

    /// Assembles the object from `parts`, which must be sorted ascending.
    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StoreResult<CompletedObject>;

    /// Discards all parts of the upload.
    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<()>;
}
