/// Error taxonomy for the Query Worker.
///
/// Two levels, matching the explorer's API contract: callers get either a
/// well-known condition they can branch on (`NotFound`, `BadRequest`,
/// `Unsupported`, `OperationInterrupted`) or an opaque `Internal` error that
/// is logged and surfaced as a 500 without leaking implementation detail.
use std::fmt;

#[derive(Debug)]
pub enum WorkerError {
    /// The requested address/tx/block/height does not exist in the index.
    NotFound(String),
    /// The request itself is malformed (bad hex, out-of-range page, etc).
    BadRequest(String),
    /// A syntactically valid request the worker does not implement.
    Unsupported(String),
    /// A long-running scan was cancelled via its `CancellationToken`.
    OperationInterrupted,
    /// Anything else: rocksdb errors, RPC transport failures, invariant
    /// violations found mid-scan. Wrapped so the source is preserved for
    /// logging but not for the API response body.
    Internal(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::NotFound(msg) => write!(f, "not found: {}", msg),
            WorkerError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            WorkerError::Unsupported(msg) => write!(f, "unsupported: {}", msg),
            WorkerError::OperationInterrupted => write!(f, "operation interrupted"),
            WorkerError::Internal(e) => write!(f, "internal error: {}", e),
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            WorkerError::Internal(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<rocksdb::Error> for WorkerError {
    fn from(e: rocksdb::Error) -> Self {
        WorkerError::Internal(Box::new(e))
    }
}

impl From<std::num::ParseIntError> for WorkerError {
    fn from(e: std::num::ParseIntError) -> Self {
        WorkerError::BadRequest(e.to_string())
    }
}

impl WorkerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        WorkerError::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        WorkerError::BadRequest(msg.into())
    }

    pub fn internal(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        WorkerError::Internal(Box::new(e))
    }

    pub fn internal_msg(msg: impl Into<String>) -> Self {
        WorkerError::Internal(msg.into().into())
    }

    /// HTTP status code this error maps to in the API layer.
    pub fn status_code(&self) -> u16 {
        match self {
            WorkerError::NotFound(_) => 404,
            WorkerError::BadRequest(_) => 400,
            WorkerError::Unsupported(_) => 501,
            WorkerError::OperationInterrupted => 499,
            WorkerError::Internal(_) => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(WorkerError::not_found("x").status_code(), 404);
        assert_eq!(WorkerError::bad_request("x").status_code(), 400);
        assert_eq!(WorkerError::Unsupported("x".into()).status_code(), 501);
        assert_eq!(WorkerError::OperationInterrupted.status_code(), 499);
        assert_eq!(WorkerError::internal_msg("x").status_code(), 500);
    }

    #[test]
    fn internal_preserves_source() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk gone");
        let err = WorkerError::internal(io_err);
        assert!(err.source().is_some());
    }
}
