//! HTTP error types for the waitlist API.
//!
//! Maps domain errors into JSON error responses. Three categories per the
//! endpoint's contract: missing configuration (500), upstream permission
//! problems (403), and everything else (500 with diagnostic detail). No
//! failure is retried — the caller resubmits.
//!
//! The verification endpoint deliberately does not use these types: every
//! failure there degrades to a redirect (see `routes::verify`).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::sheets::SheetsError;

/// Application-level error returned from the waitlist handler.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Required external credentials are absent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The upstream rejected us with a permissions problem.
    #[error("access denied: {0}")]
    Access(String),

    /// Anything else — carries the underlying message and a classification.
    #[error("internal error: {detail}")]
    Internal {
        detail: String,
        kind: &'static str,
    },
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Configuration(msg) => {
                tracing::error!(error = %msg, "waitlist endpoint misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: msg,
                        error: None,
                        kind: None,
                    },
                )
            }
            Self::Access(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    message: msg,
                    error: None,
                    kind: None,
                },
            ),
            Self::Internal { detail, kind } => {
                tracing::error!(error = %detail, kind, "waitlist submission failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        message: "failed to record waitlist entry".to_owned(),
                        error: Some(detail),
                        kind: Some(kind),
                    },
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<SheetsError> for ApiError {
    fn from(err: SheetsError) -> Self {
        match err {
            SheetsError::Access(msg) => Self::Access(msg),
            SheetsError::Credentials(e) => Self::Internal {
                detail: e.to_string(),
                kind: "credentials",
            },
            SheetsError::Http(e) => Self::Internal {
                detail: e.to_string(),
                kind: "network",
            },
            SheetsError::Upstream { status, message } => Self::Internal {
                detail: format!("sheets api returned {status}: {message}"),
                kind: "upstream",
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn access_maps_to_forbidden() {
        let resp = ApiError::Access("no access to spreadsheet".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn configuration_maps_to_internal_server_error() {
        let resp = ApiError::Configuration("credentials missing".to_owned()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn sheets_access_error_translates() {
        let err: ApiError = SheetsError::Access("denied".to_owned()).into();
        assert!(matches!(err, ApiError::Access(_)));
    }

    #[test]
    fn sheets_upstream_error_carries_classification() {
        let err: ApiError = SheetsError::Upstream {
            status: 500,
            message: "backend".to_owned(),
        }
        .into();
        assert!(matches!(err, ApiError::Internal { kind: "upstream", .. }));
    }
}
