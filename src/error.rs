//! Error taxonomy for the HTTP boundary. Every client-facing failure is a
//! value with a stable message rendered as `{"error": "..."}`;
//! infrastructure faults are logged and redacted.

use crate::domain::admission::VoteRejection;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use color_eyre::eyre::Report;
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// A vote submission broke an admission rule.
    #[error(transparent)]
    Rejected(#[from] VoteRejection),
    /// Malformed or rule-violating input outside the admission engine.
    #[error("{0}")]
    BadRequest(String),
    /// A uniqueness rule was violated.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Authentication credentials were not provided or are invalid.")]
    Unauthorized,
    #[error("Internal server error.")]
    Internal(#[from] Report),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Rejected(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Internal(report) = self {
            error!(error = ?report, "internal error while handling request");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            ApiError::Rejected(VoteRejection::AlreadyVoted).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("missing".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn rejection_text_passes_through_verbatim() {
        let err = ApiError::Rejected(VoteRejection::UnknownMenu { id: "999".into() });
        assert_eq!(err.to_string(), "Menu ID 999 is not valid for today.");
    }
}
