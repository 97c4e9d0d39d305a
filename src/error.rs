use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Terminal failures of a single summarize request.
///
/// The `Display` text is the response body sent to the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Error: Captions file not found.")]
    CaptionsNotFound,

    #[error("❌ Error: Extracted text is empty!")]
    EmptyTranscript,

    #[error("Error: No text available for summarization.")]
    NoText,

    #[error("Error processing request: {0}")]
    Request(String),

    #[error("Error parsing response: {0}")]
    ResponseShape(String),
}

impl PipelineError {
    pub fn request(err: impl std::fmt::Display) -> Self {
        PipelineError::Request(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl From<eyre::Report> for PipelineError {
    fn from(err: eyre::Report) -> Self {
        PipelineError::Request(format!("{err:#}"))
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        (self.status(), self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(PipelineError::CaptionsNotFound.to_string(), "Error: Captions file not found.");
        assert_eq!(PipelineError::EmptyTranscript.to_string(), "❌ Error: Extracted text is empty!");
        assert_eq!(
            PipelineError::NoText.to_string(),
            "Error: No text available for summarization."
        );
        assert_eq!(
            PipelineError::request("connection refused").to_string(),
            "Error processing request: connection refused"
        );
        assert_eq!(
            PipelineError::ResponseShape("missing candidates".into()).to_string(),
            "Error parsing response: missing candidates"
        );
    }

    #[test]
    fn test_every_error_is_500() {
        let response = PipelineError::EmptyTranscript.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
