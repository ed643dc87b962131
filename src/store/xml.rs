use serde::{Deserialize, Serialize};

use super::{CompletedPart, StoreError, StoreResult};

#[derive(Debug, Deserialize)]
struct InitiateMultipartUploadResult {
    #[serde(rename = "UploadId")]
    upload_id: String,
}

#[derive(Debug, Deserialize)]
struct CompleteMultipartUploadResult {
    #[serde(rename = "Location", default)]
    location: Option<String>,
    #[serde(rename = "ETag", default)]
    etag: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDocument {
    #[serde(rename = "Code")]
    code: String,
    #[serde(rename = "Message", default)]
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename = "CompleteMultipartUpload")]
struct CompleteMultipartUpload<'a> {
    #[serde(rename = "Part")]
    parts: Vec<PartXml<'a>>,
}

#[derive(Debug, Serialize)]
struct PartXml<'a> {
    #[serde(rename = "PartNumber")]
    part_number: u32,
    #[serde(rename = "ETag")]
    etag: &'a str,
}

pub(super) fn parse_upload_id(body: &str) -> StoreResult<String> {
    let result: InitiateMultipartUploadResult = quick_xml::de::from_str(body)
        .map_err(|e| StoreError::Decode(format!("InitiateMultipartUploadResult: {}", e)))?;
    Ok(result.upload_id)
}

/// Returns `(location, etag)` of a completed upload.
pub(super) fn parse_completion(body: &str) -> StoreResult<(Option<String>, Option<String>)> {
    let result: CompleteMultipartUploadResult = quick_xml::de::from_str(body)
        .map_err(|e| StoreError::Decode(format!("CompleteMultipartUploadResult: {}", e)))?;
    Ok((result.location, result.etag))
}

/// Decodes an `<Error>` document into a service error. Bodies that are not
/// error documents (empty 404s for HEAD-like answers, proxies' HTML) still
/// produce a service error keyed on the status.
pub(super) fn parse_error(status: u16, body: &str) -> StoreError {
    match quick_xml::de::from_str::<ErrorDocument>(body) {
        Ok(doc) => StoreError::service(status, doc.code, doc.message),
        Err(_) => StoreError::service(status, format!("Http{}", status), body.trim().to_string()),
    }
}

/// S3 can answer a completion with `200 OK` and an error body.
pub(super) fn is_error_document(body: &str) -> bool {
    let trimmed = body.trim_start();
    let without_decl = match trimmed.strip_prefix("<?xml") {
        Some(rest) => rest.split_once("?>").map(|(_, r)| r).unwrap_or("").trim_start(),
        None => trimmed,
    };
    without_decl.starts_with("<Error>") || without_decl.starts_with("<Error ")
}

pub(super) fn complete_body(parts: &[CompletedPart]) -> StoreResult<String> {
    let document = CompleteMultipartUpload {
        parts: parts
            .iter()
            .map(|p| PartXml {
                part_number: p.part_number,
                etag: &p.etag,
            })
            .collect(),
    };
    quick_xml::se::to_string(&document).map_err(|e| StoreError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_initiate_result() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<InitiateMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Bucket>uploads</Bucket>
  <Key>video.mp4</Key>
  <UploadId>VXBsb2FkIElEIGZvciA2aWWpbmcncyBteS1tb3ZpZS5tMnRzIHVwbG9hZA</UploadId>
</InitiateMultipartUploadResult>"#;
        assert_eq!(
            parse_upload_id(body).unwrap(),
            "VXBsb2FkIElEIGZvciA2aWWpbmcncyBteS1tb3ZpZS5tMnRzIHVwbG9hZA"
        );
    }

    #[test]
    fn parses_completion_result() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<CompleteMultipartUploadResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/">
  <Location>https://minio.example.com/uploads/video.mp4</Location>
  <Bucket>uploads</Bucket>
  <Key>video.mp4</Key>
  <ETag>"3858f62230ac3c915f300c664312c11f-9"</ETag>
</CompleteMultipartUploadResult>"#;
        let (location, etag) = parse_completion(body).unwrap();
        assert_eq!(
            location.as_deref(),
            Some("https://minio.example.com/uploads/video.mp4")
        );
        assert_eq!(etag.as_deref(), Some("\"3858f62230ac3c915f300c664312c11f-9\""));
    }

    #[test]
    fn parses_error_document() {
        let body = r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchUpload</Code>
  <Message>The specified upload does not exist.</Message>
  <RequestId>656c76696e6727732072657175657374</RequestId>
</Error>"#;
        assert!(is_error_document(body));
        let err = parse_error(404, body);
        assert!(err.is_no_such_upload());
        assert_eq!(
            err,
            StoreError::service(404, "NoSuchUpload", "The specified upload does not exist.")
        );
    }

    #[test]
    fn non_xml_error_body_is_keyed_on_status() {
        let err = parse_error(503, "Service Unavailable");
        assert_eq!(err.code(), Some("Http503"));
        assert!(!is_error_document("<CompleteMultipartUploadResult/>"));
    }

    #[test]
    fn complete_body_lists_parts_in_given_order() {
        let body = complete_body(&[
            CompletedPart {
                part_number: 1,
                etag: "d1".into(),
            },
            CompletedPart {
                part_number: 2,
                etag: "d2".into(),
            },
        ])
        .unwrap();
        assert_eq!(
            body,
            "<CompleteMultipartUpload>\
             <Part><PartNumber>1</PartNumber><ETag>d1</ETag></Part>\
             <Part><PartNumber>2</PartNumber><ETag>d2</ETag></Part>\
             </CompleteMultipartUpload>"
        );
    }
}
