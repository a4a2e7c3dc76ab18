use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Failures talking to the forum server.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid credentials")]
    Unauthorized,

    #[error("{message} (status {status})")]
    Rejected { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),
}

/// Actions the post view refuses before any request is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ActionError {
    #[error("you cannot like your own post")]
    OwnPost,

    #[error("only moderators can flag posts")]
    NotModerator,

    #[error("post is already flagged as misleading")]
    AlreadyFlagged,

    #[error("comment is empty")]
    EmptyComment,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
    detail: Option<String>,
}

impl ApiError {
    /// Builds the error for a non-success response, preferring the server's
    /// `error` or `detail` message over the raw body.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error.or(b.detail))
            .unwrap_or_else(|| {
                let body = body.trim();
                if body.is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request rejected")
                        .to_string()
                } else {
                    body.to_string()
                }
            });

        ApiError::Rejected {
            status: status.as_u16(),
            message,
        }
    }

    /// The message suitable for a transient notification.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Rejected { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}
