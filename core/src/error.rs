//! Error types for the tutoring API client.
//!
//! # Design
//! Every failure an operation can report is one variant of `ApiError`. The
//! status-code variants carry the raw response body so callers can log what
//! the backend said; the mapping from status code to variant lives in
//! `ApiError::from_status` and is total over non-2xx codes.

use thiserror::Error;

/// Errors returned by dispatch and hydration operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No endpoint configuration was installed before dispatching.
    #[error("endpoint is not configured")]
    NotConfigured,

    /// The base address has no scheme separator (`://`).
    #[error("invalid base address {0:?}: missing scheme such as http:// or https://")]
    InvalidAddress(String),

    /// The exchange failed below HTTP: connect, send, or reading the body.
    #[error("transport failure: {0}")]
    TransportFailure(String),

    /// 400, or the outgoing body could not be serialized.
    #[error("request body rejected: {0}")]
    InvalidRequestBody(String),

    /// 401: API key or user credentials rejected.
    #[error("authorization failed: {0}")]
    AuthorizationFailure(String),

    /// 403: the account being registered already exists.
    #[error("account already exists: {0}")]
    ConflictAlreadyExists(String),

    /// 412: no match for a search, or no open slot for scheduling.
    #[error("criteria not satisfiable: {0}")]
    UnsatisfiableCriteria(String),

    /// 422: bearer token expired or malformed.
    #[error("invalid session: {0}")]
    InvalidSession(String),

    /// Any other non-2xx status.
    #[error("unexpected server error (HTTP {status}): {body}")]
    UnknownServerError { status: u16, body: String },

    /// Neither search filter was provided.
    #[error("invalid filter: at least one of locality or expertise is required")]
    InvalidFilter,

    /// The account type lookup returned something other than a known kind.
    #[error("account type unresolved: {0:?}")]
    AccountTypeUnresolved(String),

    /// A success payload did not match the expected shape.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

/// Fieldless discriminant of `ApiError`, for branching and test vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotConfigured,
    InvalidAddress,
    TransportFailure,
    InvalidRequestBody,
    AuthorizationFailure,
    ConflictAlreadyExists,
    UnsatisfiableCriteria,
    InvalidSession,
    UnknownServerError,
    InvalidFilter,
    AccountTypeUnresolved,
    MalformedPayload,
}

impl ApiError {
    /// Classify a non-success status code. Codes not listed explicitly fall
    /// through to `UnknownServerError`.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            400 => ApiError::InvalidRequestBody(body),
            401 => ApiError::AuthorizationFailure(body),
            403 => ApiError::ConflictAlreadyExists(body),
            412 => ApiError::UnsatisfiableCriteria(body),
            422 => ApiError::InvalidSession(body),
            _ => ApiError::UnknownServerError { status, body },
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::NotConfigured => ErrorKind::NotConfigured,
            ApiError::InvalidAddress(_) => ErrorKind::InvalidAddress,
            ApiError::TransportFailure(_) => ErrorKind::TransportFailure,
            ApiError::InvalidRequestBody(_) => ErrorKind::InvalidRequestBody,
            ApiError::AuthorizationFailure(_) => ErrorKind::AuthorizationFailure,
            ApiError::ConflictAlreadyExists(_) => ErrorKind::ConflictAlreadyExists,
            ApiError::UnsatisfiableCriteria(_) => ErrorKind::UnsatisfiableCriteria,
            ApiError::InvalidSession(_) => ErrorKind::InvalidSession,
            ApiError::UnknownServerError { .. } => ErrorKind::UnknownServerError,
            ApiError::InvalidFilter => ErrorKind::InvalidFilter,
            ApiError::AccountTypeUnresolved(_) => ErrorKind::AccountTypeUnresolved,
            ApiError::MalformedPayload(_) => ErrorKind::MalformedPayload,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::MalformedPayload(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listed_statuses_map_to_their_kind() {
        let cases = [
            (400, ErrorKind::InvalidRequestBody),
            (401, ErrorKind::AuthorizationFailure),
            (403, ErrorKind::ConflictAlreadyExists),
            (412, ErrorKind::UnsatisfiableCriteria),
            (422, ErrorKind::InvalidSession),
        ];
        for (status, kind) in cases {
            assert_eq!(ApiError::from_status(status, String::new()).kind(), kind, "{status}");
        }
    }

    #[test]
    fn unlisted_statuses_fall_through_to_unknown() {
        for status in [100, 302, 404, 409, 418, 500, 503] {
            let err = ApiError::from_status(status, "boom".to_string());
            match err {
                ApiError::UnknownServerError { status: s, body } => {
                    assert_eq!(s, status);
                    assert_eq!(body, "boom");
                }
                other => panic!("{status}: unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn display_includes_detail() {
        let err = ApiError::from_status(503, "down for maintenance".to_string());
        assert_eq!(err.to_string(), "unexpected server error (HTTP 503): down for maintenance");
    }
}
