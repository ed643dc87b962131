//! # S3 REST Client
//!
//! Implements [`ObjectStore`] by sending SigV4-signed path-style requests to
//! an S3-compatible endpoint (MinIO, R2's S3 API, AWS) through the Workers
//! fetch API.
//!
//! Request construction and response decoding are plain functions over
//! strings; only [`S3Store::send`] touches the runtime.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use worker::{Fetch, Headers, Method, Request, RequestInit};

use super::sigv4::{canonical_query, encode_path, SigV4Signer};
use super::xml;
use super::{CompletedObject, CompletedPart, ObjectStore, StoreError, StoreResult};
use crate::config::StoreConfig;

/// A signed request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// Status and body of a store response.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreResponse {
    pub status: u16,
    pub body: String,
}

pub struct S3Store {
    config: StoreConfig,
    signer: SigV4Signer,
}

impl S3Store {
    pub fn new(config: StoreConfig) -> Self {
        let signer = SigV4Signer::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            config.region.clone(),
        );
        Self { config, signer }
    }

    fn object_url(&self, path: &str, query: &str) -> String {
        if query.is_empty() {
            format!("{}{}", self.config.base_url(), path)
        } else {
            format!("{}{}?{}", self.config.base_url(), path, query)
        }
    }

    /// Builds and signs a request against `/{bucket}/{key}`.
    pub fn build_request(
        &self,
        method: &'static str,
        key: &str,
        query: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
        body: Option<String>,
    ) -> StoreResult<SignedRequest> {
        let path = encode_path(&self.config.bucket, key);
        let payload = body.as_deref().unwrap_or("").as_bytes();
        let mut headers = self.signer.sign_request(
            method,
            &self.config.host(),
            &path,
            query,
            extra_headers,
            payload,
            Utc::now(),
        )?;
        headers.extend(
            extra_headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string())),
        );

        Ok(SignedRequest {
            method,
            url: self.object_url(&path, &canonical_query(query)),
            headers,
            body,
        })
    }

    /// Object URL reported when a store omits `Location` on completion.
    pub fn fallback_location(&self, key: &str) -> String {
        self.object_url(&encode_path(&self.config.bucket, key), "")
    }

    async fn send(&self, request: SignedRequest) -> StoreResult<StoreResponse> {
        let headers = Headers::new();
        for (name, value) in &request.headers {
            headers
                .set(name, value)
                .map_err(|e| StoreError::Transport(e.to_string()))?;
        }

        let method = match request.method {
            "POST" => Method::Post,
            "PUT" => Method::Put,
            "DELETE" => Method::Delete,
            _ => Method::Get,
        };

        let mut init = RequestInit::new();
        init.with_method(method).with_headers(headers);
        if let Some(body) = &request.body {
            init.with_body(Some(body.as_str().into()));
        }

        let req = Request::new_with_init(&request.url, &init)
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        let mut res = Fetch::Request(req)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let status = res.status_code();
        let body = res
            .text()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Ok(StoreResponse { status, body })
    }
}

/// Maps a create-multipart-upload response to the upload id.
pub fn read_create_response(response: &StoreResponse) -> StoreResult<String> {
    if !is_success(response.status) {
        return Err(xml::parse_error(response.status, &response.body));
    }
    xml::parse_upload_id(&response.body)
}

/// Maps a complete-multipart-upload response to `(location, etag)`.
pub fn read_complete_response(
    response: &StoreResponse,
) -> StoreResult<(Option<String>, Option<String>)> {
    if !is_success(response.status) || xml::is_error_document(&response.body) {
        return Err(xml::parse_error(response.status, &response.body));
    }
    xml::parse_completion(&response.body)
}

pub fn read_abort_response(response: &StoreResponse) -> StoreResult<()> {
    if !is_success(response.status) {
        return Err(xml::parse_error(response.status, &response.body));
    }
    Ok(())
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

#[async_trait(?Send)]
impl ObjectStore for S3Store {
    fn bucket(&self) -> &str {
        &self.config.bucket
    }

    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StoreResult<String> {
        let request = self.build_request(
            "POST",
            key,
            &[("uploads", "")],
            &[("content-type", content_type)],
            None,
        )?;
        let response = self.send(request).await?;
        read_create_response(&response)
    }

    fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        expires_in: Duration,
    ) -> StoreResult<String> {
        let path = encode_path(&self.config.bucket, key);
        let part_number = part_number.to_string();
        let query = self.signer.presign(
            "PUT",
            &self.config.host(),
            &path,
            &[("partNumber", part_number.as_str()), ("uploadId", upload_id)],
            expires_in,
            Utc::now(),
        )?;
        Ok(self.object_url(&path, &query))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StoreResult<CompletedObject> {
        let body = xml::complete_body(parts)?;
        let request = self.build_request(
            "POST",
            key,
            &[("uploadId", upload_id)],
            &[("content-type", "application/xml")],
            Some(body),
        )?;
        let response = self.send(request).await?;
        let (location, etag) = read_complete_response(&response)?;

        Ok(CompletedObject {
            location: location
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| self.fallback_location(key)),
            etag,
        })
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<()> {
        let request = self.build_request("DELETE", key, &[("uploadId", upload_id)], &[], None)?;
        let response = self.send(request).await?;
        read_abort_response(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> S3Store {
        S3Store::new(StoreConfig {
            endpoint: "minio.internal".to_string(),
            port: 9000,
            use_ssl: false,
            access_key: "minio".to_string(),
            secret_key: "minio-secret".to_string(),
            bucket: "uploads".to_string(),
            region: "us-east-1".to_string(),
        })
    }

    fn header<'a>(request: &'a SignedRequest, name: &str) -> Option<&'a str> {
        request
            .headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn create_request_targets_uploads_subresource() {
        let request = store()
            .build_request(
                "POST",
                "course 1/video.mp4",
                &[("uploads", "")],
                &[("content-type", "video/mp4")],
                None,
            )
            .unwrap();

        assert_eq!(
            request.url,
            "http://minio.internal:9000/uploads/course%201/video.mp4?uploads="
        );
        assert_eq!(header(&request, "content-type"), Some("video/mp4"));
        let auth = header(&request, "authorization").unwrap();
        assert!(auth.starts_with("AWS4-HMAC-SHA256 Credential=minio/"));
        assert!(auth.contains("SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date"));
        assert!(!auth.contains("minio-secret"));
    }

    #[test]
    fn presigned_part_url_is_scoped_to_one_part() {
        let url = store()
            .presign_upload_part("video.mp4", "upload-1", 3, Duration::from_secs(3600))
            .unwrap();

        assert!(url.starts_with("http://minio.internal:9000/uploads/video.mp4?"));
        assert!(url.contains("partNumber=3"));
        assert!(url.contains("uploadId=upload-1"));
        assert!(url.contains("X-Amz-Expires=3600"));
        assert!(url.contains("X-Amz-Signature="));
    }

    #[test]
    fn completion_with_error_body_is_a_failure() {
        let response = StoreResponse {
            status: 200,
            body: "<?xml version=\"1.0\"?><Error><Code>InternalError</Code><Message>We encountered an internal error.</Message></Error>".to_string(),
        };
        let err = read_complete_response(&response).unwrap_err();
        assert_eq!(err.code(), Some("InternalError"));
    }

    #[test]
    fn abort_maps_missing_upload_to_service_error() {
        let response = StoreResponse {
            status: 404,
            body: "<Error><Code>NoSuchUpload</Code><Message>The specified upload does not exist.</Message></Error>".to_string(),
        };
        assert!(read_abort_response(&response).unwrap_err().is_no_such_upload());
        assert!(read_abort_response(&StoreResponse {
            status: 204,
            body: String::new()
        })
        .is_ok());
    }

    #[test]
    fn create_response_yields_upload_id() {
        let response = StoreResponse {
            status: 200,
            body: "<InitiateMultipartUploadResult><Bucket>uploads</Bucket><Key>a</Key><UploadId>u-1</UploadId></InitiateMultipartUploadResult>".to_string(),
        };
        assert_eq!(read_create_response(&response).unwrap(), "u-1");

        let denied = StoreResponse {
            status: 403,
            body: "<Error><Code>AccessDenied</Code><Message>Access Denied</Message></Error>".to_string(),
        };
        assert_eq!(read_create_response(&denied).unwrap_err().code(), Some("AccessDenied"));
    }

    #[test]
    fn fallback_location_is_path_style_object_url() {
        assert_eq!(
            store().fallback_location("video.mp4"),
            "http://minio.internal:9000/uploads/video.mp4"
        );
    }
}
