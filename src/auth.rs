//! # Identity Gate
//!
//! The orchestrator trusts a gate's verdict and performs no authorization of
//! its own; multipart routes are open to every permitted identity regardless
//! of role.
//!
//! - [`JwtGate`] verifies HS256 bearer tokens issued by the LMS auth service
//! - [`OpenGate`] admits everyone as `anonymous` (no secret configured)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::models::UserRole;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Option<UserRole>,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            subject: "anonymous".to_string(),
            role: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Permitted(Identity),
    Denied(String),
}

pub trait IdentityGate {
    /// Judges the raw `Authorization` header value of a request.
    fn authorize(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Verdict;
}

pub struct OpenGate;

impl IdentityGate for OpenGate {
    fn authorize(&self, _authorization: Option<&str>, _now: DateTime<Utc>) -> Verdict {
        Verdict::Permitted(Identity::anonymous())
    }
}

#[derive(Deserialize)]
struct JwtHeader {
    alg: String,
}

#[derive(Deserialize)]
struct Claims {
    sub: Option<String>,
    id: Option<String>,
    role: Option<String>,
    exp: Option<i64>,
}

pub struct JwtGate {
    secret: Vec<u8>,
}

impl JwtGate {
    pub fn new(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Identity, String> {
        let mut segments = token.split('.');
        let (header, payload, signature) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err("malformed token".to_string()),
            };

        let jwt_header: JwtHeader = decode_segment(header)?;
        if jwt_header.alg != "HS256" {
            return Err(format!("unsupported token algorithm {}", jwt_header.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| "malformed token signature".to_string())?;
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|_| "unusable token secret".to_string())?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| "invalid token signature".to_string())?;

        let claims: Claims = decode_segment(payload)?;
        if let Some(exp) = claims.exp {
            if exp <= now.timestamp() {
                return Err("token expired".to_string());
            }
        }

        let subject = claims
            .sub
            .or(claims.id)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "token has no subject".to_string())?;

        Ok(Identity {
            subject,
            role: claims.role.and_then(|r| r.parse().ok()),
        })
    }
}

impl IdentityGate for JwtGate {
    fn authorize(&self, authorization: Option<&str>, now: DateTime<Utc>) -> Verdict {
        let token = match authorization.and_then(bearer_token) {
            Some(token) => token,
            None => return Verdict::Denied("missing bearer token".to_string()),
        };
        match self.verify(token, now) {
            Ok(identity) => Verdict::Permitted(identity),
            Err(reason) => Verdict::Denied(reason),
        }
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

fn decode_segment<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, String> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| "malformed token".to_string())?;
    serde_json::from_slice(&bytes).map_err(|_| "malformed token".to_string())
}
