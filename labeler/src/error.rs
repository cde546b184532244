use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelerError {
    #[error("labeler: request failed: {0}")]
    Transport(String),

    #[error("labeler: API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("labeler: no response from model")]
    EmptyResponse,

    #[error("labeler: invalid response: {0}")]
    Decode(String),
}

impl LabelerError {
    /// Returns true for rate limiting (429).
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::Api { status: 429, .. })
    }

    /// Returns true for 5xx responses.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 500)
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_)) || self.is_rate_limit() || self.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(LabelerError::Transport("reset".into()).is_retryable());
        assert!(LabelerError::Api { status: 429, body: String::new() }.is_retryable());
        assert!(LabelerError::Api { status: 503, body: String::new() }.is_retryable());
        assert!(!LabelerError::Api { status: 401, body: String::new() }.is_retryable());
        assert!(!LabelerError::EmptyResponse.is_retryable());
        assert!(!LabelerError::Decode("eof".into()).is_retryable());
    }
}
