use std::time::Duration;

/// Failure taxonomy for the extraction workflow.
///
/// Collaborator failures are converted into one of these variants at the
/// boundary of each public operation; none of them escapes as an unhandled
/// fault. Malformed embedded JSON in stored rows is recovered inside the
/// store (empty default) and never surfaces here.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// Missing or malformed caller input (no URL, unsupported scheme, ...).
    #[error("{0}")]
    Validation(String),

    /// Missing service credentials or endpoint. The message names the
    /// variable, never its value.
    #[error("{0}")]
    Config(String),

    /// The extraction service rejected the configured credential.
    #[error("extraction service rejected the configured credentials")]
    Auth,

    /// The synchronous extraction path did not answer within its bound.
    #[error("extraction timed out after {0:?}")]
    Timeout(Duration),

    /// Any other non-success response from the extraction service.
    #[error("{message}")]
    Upstream {
        status: Option<u16>,
        message: String,
    },

    /// Polling an unknown job, or loading a missing aggregate id.
    #[error("not found")]
    NotFound,
}

impl ExtractionError {
    pub fn upstream(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ExtractionError;

    #[test]
    fn upstream_display_is_the_plain_message() {
        let err = ExtractionError::upstream(Some(502), "API error: 502");
        assert_eq!(err.to_string(), "API error: 502");
    }

    #[test]
    fn config_display_never_contains_values() {
        let err = ExtractionError::Config("GUIDEBASE_API_KEY is not set".to_string());
        assert!(err.to_string().contains("GUIDEBASE_API_KEY"));
    }
}
