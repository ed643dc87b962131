use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::CompletedPart;

/// Lifecycle of an upload session.
///
/// The store owns this state; the orchestrator never records it and only
/// reports the state an operation leads to.
///
/// ```text
///  (none) --initiate--> Initiated --complete--> Completed
///                           |
///                           +-----abort-------> Aborted
/// ```
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initiated,
    Completed,
    Aborted,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Instructor,
    Student,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Instructor => "instructor",
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instructor" => Ok(UserRole::Instructor),
            "student" => Ok(UserRole::Student),
            "admin" => Ok(UserRole::Admin),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    #[serde(alias = "filename")]
    pub key: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InitiateResponse {
    pub upload_id: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct SignPartRequest {
    pub key: Option<String>,
    pub upload_id: Option<String>,
    /// Kept raw: clients send numbers and numeric strings.
    pub part_number: Option<Value>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignPartResponse {
    pub url: String,
    pub expires_in: u64,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct CompleteRequest {
    pub key: Option<String>,
    pub upload_id: Option<String>,
    /// Kept raw so malformed entries can be dropped one by one.
    pub parts: Option<Value>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompleteResponse {
    pub location: String,
    pub bucket: String,
    pub key: String,
}

#[derive(Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct AbortRequest {
    pub key: Option<String>,
    pub upload_id: Option<String>,
}

/// How an abort ended. `AlreadyGone` means the store no longer knew the
/// upload, which leaves nothing in flight just like a real abort.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AbortOutcome {
    Aborted,
    AlreadyGone,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct AbortResponse {
    pub aborted: bool,
    pub outcome: AbortOutcome,
}

impl From<AbortOutcome> for AbortResponse {
    fn from(outcome: AbortOutcome) -> Self {
        Self {
            aborted: true,
            outcome,
        }
    }
}

/// Reads a positive integer part number from a JSON number or numeric
/// string. Zero, negatives, fractions and anything above `u32::MAX` yield
/// `None`.
pub fn parse_part_number(value: &Value) -> Option<u32> {
    let number = match value {
        Value::Number(n) => match n.as_u64() {
            Some(v) => v as f64,
            None => n.as_f64()?,
        },
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };

    if number.is_finite() && number.fract() == 0.0 && number >= 1.0 && number <= u32::MAX as f64 {
        Some(number as u32)
    } else {
        None
    }
}

/// Turns one client-reported manifest entry into a part, or `None` when the
/// entry lacks a usable digest or part number.
pub fn manifest_part(entry: &Value) -> Option<CompletedPart> {
    let etag = ["eTag", "ETag", "etag", "digest"]
        .iter()
        .find_map(|name| entry.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .filter(|etag| !etag.is_empty())?;
    let part_number = parse_part_number(entry.get("partNumber")?)?;

    Some(CompletedPart {
        part_number,
        etag: etag.to_string(),
    })
}
