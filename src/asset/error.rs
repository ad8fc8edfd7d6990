//! Asset middleware error types

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Errors that end a request inside the asset middleware
///
/// A missing asset is not an error: the request falls through to the
/// wrapped handler instead.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("{path}: is a directory")]
    DirectoryRequested { path: String },

    #[error("{path}: stat failed: {source}")]
    Stat {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: open failed: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: hashing failed: {source}")]
    Hash {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}: asset does not support random access")]
    NotSeekable { path: String },

    #[error("{path}: seek failed: {source}")]
    Seek {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl AssetError {
    /// Status code sent to the client
    pub fn status_code(&self) -> StatusCode {
        match self {
            AssetError::DirectoryRequested { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this error should result in a 404 Not Found response
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::DirectoryRequested { .. })
    }

    /// Check if this error is a failure of the asset source or stream
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AssetError {
    fn into_response(self) -> Response {
        plain_status(self.status_code())
    }
}

/// A bare status response whose body is the canonical reason phrase
pub(crate) fn plain_status(status: StatusCode) -> Response {
    let body = format!("{}\n", status.canonical_reason().unwrap_or("Error"));
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
        (header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff")),
    ];
    (status, headers, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_status_codes() {
        let err = AssetError::DirectoryRequested {
            path: "assets/css".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert!(err.is_not_found());
        assert!(!err.is_server_error());

        let err = AssetError::Stat {
            path: "assets/x".to_string(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.is_server_error());

        let err = AssetError::NotSeekable {
            path: "assets/pipe".to_string(),
        };
        assert!(err.is_server_error());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_error_display_includes_path() {
        let err = AssetError::Open {
            path: "assets/app.js".to_string(),
            source: io::Error::new(io::ErrorKind::Other, "boom"),
        };
        let message = err.to_string();
        assert!(message.contains("assets/app.js"));
        assert!(message.contains("boom"));
    }

    #[test]
    fn test_into_response() {
        let response = AssetError::DirectoryRequested {
            path: "assets/css".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
        assert_eq!(response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    }
}
