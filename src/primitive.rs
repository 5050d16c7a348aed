//! Primitives and essential dependencies

use std::fmt::{Display, Formatter};

use axum::{http::StatusCode, response::IntoResponse, Json};

// Reexport or redefine types.

/// Anyhow error
pub use anyhow;

/// Tracing
pub use tracing;

/// Pipeline error.
///
/// Created at the point of failure and never retried. The cause is the
/// short string the client gets back as a JSON string; the source, if
/// any, only ever reaches the logs.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// 400 Bad Request: missing or malformed parameters
    Input {
        cause: String,
        #[source]
        source: Option<anyhow::Error>,
    },
    /// 400 Bad Request: the URL is malformed or does not hold an image
    Fetch {
        cause: String,
        #[source]
        source: Option<anyhow::Error>,
    },
    /// 500 Internal Server Error: the thumbnail could not be encoded
    Encoding {
        cause: String,
        #[source]
        source: Option<anyhow::Error>,
    },
}

impl PipelineError {
    /// Bad or missing parameter, no underlying error.
    pub fn input(cause: impl Into<String>) -> Self {
        Self::Input {
            cause: cause.into(),
            source: None,
        }
    }

    /// Fetch failure with the error that caused it.
    pub fn fetch(cause: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Fetch {
            cause: cause.into(),
            source: Some(source),
        }
    }

    /// Encoding failure with the error that caused it.
    pub fn encoding(cause: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Encoding {
            cause: cause.into(),
            source: Some(source),
        }
    }

    /// The client-visible cause.
    pub fn cause(&self) -> &str {
        match self {
            PipelineError::Input { cause, .. }
            | PipelineError::Fetch { cause, .. }
            | PipelineError::Encoding { cause, .. } => cause,
        }
    }

    /// The underlying error, if any.
    fn origin(&self) -> Option<&anyhow::Error> {
        match self {
            PipelineError::Input { source, .. }
            | PipelineError::Fetch { source, .. }
            | PipelineError::Encoding { source, .. } => source.as_ref(),
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            PipelineError::Input { .. } | PipelineError::Fetch { .. } => {
                StatusCode::BAD_REQUEST
            }
            PipelineError::Encoding { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Input { cause, .. } => {
                write!(f, "Input error: {}", cause)
            }
            PipelineError::Fetch { cause, .. } => {
                write!(f, "Fetch error: {}", cause)
            }
            PipelineError::Encoding { cause, .. } => {
                write!(f, "Encoding error: {}", cause)
            }
        }
    }
}

impl IntoResponse for PipelineError {
    /// Render as the status code plus the cause as a JSON string.
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        // Logged before the response is written.
        match self.origin() {
            Some(e) => {
                tracing::warn!(status = status.as_u16(), "{self}: {e:#}")
            }
            None => tracing::warn!(status = status.as_u16(), "{self}"),
        }
        (status, Json(self.cause().to_owned())).into_response()
    }
}

/// Pipeline Result. You can return this type directly in an
/// Axum endpoint handler. Errors turn into a JSON string with the
/// correct status code.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        assert_eq!(
            PipelineError::input("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::fetch("x", anyhow::anyhow!("y")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PipelineError::encoding("x", anyhow::anyhow!("y")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_is_the_cause_as_json() {
        let response = PipelineError::input("url parameter is required")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let cause: String = serde_json::from_slice(&body).unwrap();
        assert_eq!(cause, "url parameter is required");
    }
}
