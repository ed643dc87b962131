//! In-process [`ObjectStore`] following the multipart rules of S3: unique
//! upload ids, digest checks on completion, and `NoSuchUpload` once a
//! session has been completed or aborted.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::sigv4::{encode_path, SigV4Signer};
use super::{CompletedObject, CompletedPart, ObjectStore, StoreError, StoreResult};

const HOST: &str = "memory.local";

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub content_type: String,
    pub parts: Vec<u32>,
}

struct Upload {
    key: String,
    content_type: String,
    parts: BTreeMap<u32, String>,
}

#[derive(Default)]
struct State {
    uploads: HashMap<String, Upload>,
    objects: HashMap<String, StoredObject>,
    calls: Vec<&'static str>,
    fail_next: Option<StoreError>,
}

pub struct MemoryStore {
    bucket: String,
    signer: SigV4Signer,
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new(bucket: &str) -> Self {
        Self {
            bucket: bucket.to_string(),
            signer: SigV4Signer::new("memory", "memory-secret", "us-east-1"),
            state: Mutex::new(State::default()),
        }
    }

    /// Stands in for the client's direct `PUT` to a presigned URL.
    pub fn record_part(&self, upload_id: &str, part_number: u32, etag: &str) {
        let mut state = self.state.lock().unwrap();
        if let Some(upload) = state.uploads.get_mut(upload_id) {
            upload.parts.insert(part_number, etag.to_string());
        }
    }

    /// Makes the next store call fail with `error`.
    pub fn fail_next(&self, error: StoreError) {
        self.state.lock().unwrap().fail_next = Some(error);
    }

    /// Names of the calls received so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn object(&self, key: &str) -> Option<StoredObject> {
        self.state.lock().unwrap().objects.get(key).cloned()
    }

    pub fn open_uploads(&self) -> usize {
        self.state.lock().unwrap().uploads.len()
    }

    fn enter(&self, call: &'static str) -> StoreResult<std::sync::MutexGuard<'_, State>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.fail_next.take() {
            Some(err) => Err(err),
            None => Ok(state),
        }
    }
}

fn no_such_upload() -> StoreError {
    StoreError::service(
        404,
        "NoSuchUpload",
        "The specified upload does not exist. The upload ID may be invalid, or the upload may have been aborted or completed.",
    )
}

#[async_trait(?Send)]
impl ObjectStore for MemoryStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn create_multipart_upload(&self, key: &str, content_type: &str) -> StoreResult<String> {
        let mut state = self.enter("create")?;
        let upload_id = Uuid::new_v4().simple().to_string();
        state.uploads.insert(
            upload_id.clone(),
            Upload {
                key: key.to_string(),
                content_type: content_type.to_string(),
                parts: BTreeMap::new(),
            },
        );
        Ok(upload_id)
    }

    fn presign_upload_part(
        &self,
        key: &str,
        upload_id: &str,
        part_number: u32,
        expires_in: Duration,
    ) -> StoreResult<String> {
        drop(self.enter("presign")?);
        let path = encode_path(&self.bucket, key);
        let part_number = part_number.to_string();
        let query = self.signer.presign(
            "PUT",
            HOST,
            &path,
            &[("partNumber", part_number.as_str()), ("uploadId", upload_id)],
            expires_in,
            Utc::now(),
        )?;
        Ok(format!("https://{}{}?{}", HOST, path, query))
    }

    async fn complete_multipart_upload(
        &self,
        key: &str,
        upload_id: &str,
        parts: &[CompletedPart],
    ) -> StoreResult<CompletedObject> {
        let mut state = self.enter("complete")?;
        let upload = match state.uploads.get(upload_id) {
            Some(upload) if upload.key == key => upload,
            _ => return Err(no_such_upload()),
        };

        if parts
            .windows(2)
            .any(|pair| pair[0].part_number >= pair[1].part_number)
        {
            return Err(StoreError::service(
                400,
                "InvalidPartOrder",
                "The list of parts was not in ascending order.",
            ));
        }
        for part in parts {
            if upload.parts.get(&part.part_number) != Some(&part.etag) {
                return Err(StoreError::service(
                    400,
                    "InvalidPart",
                    "One or more of the specified parts could not be found.",
                ));
            }
        }

        let object = StoredObject {
            content_type: upload.content_type.clone(),
            parts: parts.iter().map(|p| p.part_number).collect(),
        };
        state.uploads.remove(upload_id);
        state.objects.insert(key.to_string(), object);

        Ok(CompletedObject {
            location: format!("https://{}{}", HOST, encode_path(&self.bucket, key)),
            etag: Some(format!("\"{}-{}\"", upload_id, parts.len())),
        })
    }

    async fn abort_multipart_upload(&self, key: &str, upload_id: &str) -> StoreResult<()> {
        let mut state = self.enter("abort")?;
        let open = matches!(state.uploads.get(upload_id), Some(upload) if upload.key == key);
        if !open {
            return Err(no_such_upload());
        }
        state.uploads.remove(upload_id);
        Ok(())
    }
}
