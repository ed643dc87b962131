use thiserror::Error;

/// Failures reported by an [`ObjectStore`](super::ObjectStore).
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The store answered with an error document.
    #[error("{code}: {message} (status {status})")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The store could not be reached.
    #[error("transport error: {0}")]
    Transport(String),

    /// A request or URL could not be signed.
    #[error("signing error: {0}")]
    Signing(String),

    /// The store answered with something that is not a valid S3 document.
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        StoreError::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            StoreError::Service { code, .. } => Some(code),
            _ => None,
        }
    }

    /// The session named by the upload id does not exist (never did, or was
    /// already completed or aborted).
    pub fn is_no_such_upload(&self) -> bool {
        self.code() == Some("NoSuchUpload")
    }

    /// The store blamed the caller's input rather than itself.
    pub fn is_caller_mistake(&self) -> bool {
        matches!(
            self.code(),
            Some("NoSuchBucket" | "NoSuchKey" | "InvalidArgument" | "KeyTooLongError")
        )
    }
}
