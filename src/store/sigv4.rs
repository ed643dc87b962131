//! AWS Signature Version 4 for S3-compatible stores.
//!
//! Two flavours are needed: header authentication for the requests the
//! orchestrator sends itself, and query-string presigning for the part URLs
//! handed to clients.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use super::{StoreError, StoreResult};
use crate::constants::MAX_PART_URL_TTL_SECS;

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "s3";
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

#[derive(Clone)]
pub struct SigV4Signer {
    access_key: String,
    secret_key: String,
    region: String,
}

impl SigV4Signer {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            region: region.into(),
        }
    }

    /// Signs a request with an `Authorization` header.
    ///
    /// `path` must already be URI-encoded (see [`encode_path`]). Returns the
    /// headers to attach: `x-amz-date`, `x-amz-content-sha256` and
    /// `authorization`. `extra_headers` are signed as given and must be sent
    /// unchanged by the caller.
    pub fn sign_request(
        &self,
        method: &str,
        host: &str,
        path: &str,
        query: &[(&str, &str)],
        extra_headers: &[(&str, &str)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<(String, String)>> {
        let amz_date = amz_date(now);
        let payload_hash = hex::encode(Sha256::digest(payload));

        let mut headers: Vec<(String, String)> = vec![
            ("host".to_string(), host.to_string()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        headers.extend(
            extra_headers
                .iter()
                .map(|(name, value)| (name.to_ascii_lowercase(), value.trim().to_string())),
        );
        headers.sort();

        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(";");
        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value))
            .collect();

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method,
            path,
            canonical_query(query),
            canonical_headers,
            signed_headers,
            payload_hash
        );
        let scope = self.scope(now);
        let signature = self.signature(now, &scope, &canonical_request)?;

        let authorization = format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, self.access_key, scope, signed_headers, signature
        );

        Ok(vec![
            ("x-amz-date".to_string(), amz_date),
            ("x-amz-content-sha256".to_string(), payload_hash),
            ("authorization".to_string(), authorization),
        ])
    }

    /// Produces the query string of a presigned URL, signature included.
    ///
    /// Only `host` is signed and the payload is `UNSIGNED-PAYLOAD`, so the
    /// bearer can send any body but nothing else about the request can change.
    pub fn presign(
        &self,
        method: &str,
        host: &str,
        path: &str,
        query: &[(&str, &str)],
        expires_in: Duration,
        now: DateTime<Utc>,
    ) -> StoreResult<String> {
        let expires = expires_in.as_secs();
        if expires == 0 || expires > MAX_PART_URL_TTL_SECS {
            return Err(StoreError::Signing(format!(
                "presign expiry must be between 1 and {} seconds, got {}",
                MAX_PART_URL_TTL_SECS, expires
            )));
        }

        let amz_date = amz_date(now);
        let scope = self.scope(now);
        let credential = format!("{}/{}", self.access_key, scope);
        let expires = expires.to_string();

        let mut params: Vec<(&str, &str)> = query.to_vec();
        params.extend([
            ("X-Amz-Algorithm", ALGORITHM),
            ("X-Amz-Credential", credential.as_str()),
            ("X-Amz-Date", amz_date.as_str()),
            ("X-Amz-Expires", expires.as_str()),
            ("X-Amz-SignedHeaders", "host"),
        ]);
        let query_string = canonical_query(&params);

        let canonical_request = format!(
            "{}\n{}\n{}\nhost:{}\n\nhost\n{}",
            method, path, query_string, host, UNSIGNED_PAYLOAD
        );
        let signature = self.signature(now, &scope, &canonical_request)?;

        Ok(format!("{}&X-Amz-Signature={}", query_string, signature))
    }

    fn scope(&self, now: DateTime<Utc>) -> String {
        format!(
            "{}/{}/{}/aws4_request",
            now.format("%Y%m%d"),
            self.region,
            SERVICE
        )
    }

    fn signature(
        &self,
        now: DateTime<Utc>,
        scope: &str,
        canonical_request: &str,
    ) -> StoreResult<String> {
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date(now),
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let date = now.format("%Y%m%d").to_string();
        let k_date = hmac_sha256(format!("AWS4{}", self.secret_key).as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes())?;
        let k_signing = hmac_sha256(&k_service, b"aws4_request")?;

        Ok(hex::encode(hmac_sha256(
            &k_signing,
            string_to_sign.as_bytes(),
        )?))
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> StoreResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| StoreError::Signing(e.to_string()))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn amz_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}

/// Percent-encodes per the SigV4 rules: everything except `A-Za-z0-9-_.~`
/// (and `/` when `keep_slash`) becomes `%XX` with uppercase hex.
pub fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Path-style object path: `/{bucket}/{key}`, encoded once.
pub fn encode_path(bucket: &str, key: &str) -> String {
    format!("/{}/{}", uri_encode(bucket, false), uri_encode(key, true))
}

/// Encodes every pair and sorts by encoded name, then value.
pub fn canonical_query(params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k, false), uri_encode(v, false)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}
