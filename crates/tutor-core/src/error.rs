use std::time::Duration;
use thiserror::Error;

/// Failures raised by a [`ChatClient`](crate::traits::ChatClient).
#[derive(Debug, Error)]
pub enum ChatError {
    /// No credential or endpoint is configured for the language model
    #[error("no API credential configured for the chat client")]
    MissingCredential,

    /// The call did not complete within the caller-imposed bound
    #[error("chat request timed out after {0:?}")]
    Timeout(Duration),

    /// Non-2xx response from the provider
    #[error("chat request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    /// Connection, TLS or body read failure
    #[error("chat transport error: {0}")]
    Transport(String),

    /// The provider answered but the completion could not be extracted
    #[error("malformed chat response: {0}")]
    MalformedResponse(String),
}

/// Outcome of a generation strategy that could not produce a result.
///
/// Both variants route to the fallback strategy; neither is surfaced to
/// callers of the tutor service.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("strategy '{strategy}' is not configured: {reason}")]
    ConfigurationMissing { strategy: String, reason: String },

    #[error("generation unavailable from strategy '{strategy}': {reason}")]
    Unavailable { strategy: String, reason: String },
}

impl GenerationError {
    pub fn from_chat(strategy: &str, error: ChatError) -> Self {
        match error {
            ChatError::MissingCredential => GenerationError::ConfigurationMissing {
                strategy: strategy.to_string(),
                reason: error.to_string(),
            },
            other => GenerationError::Unavailable {
                strategy: strategy.to_string(),
                reason: other.to_string(),
            },
        }
    }

    pub fn strategy(&self) -> &str {
        match self {
            GenerationError::ConfigurationMissing { strategy, .. }
            | GenerationError::Unavailable { strategy, .. } => strategy,
        }
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// Errors that escape the tutor service.
#[derive(Debug, Error)]
pub enum TutorError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

pub type TutorResult<T> = Result<T, TutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_maps_to_configuration_missing() {
        let err = GenerationError::from_chat("llm", ChatError::MissingCredential);
        assert!(matches!(err, GenerationError::ConfigurationMissing { .. }));
        assert_eq!(err.strategy(), "llm");
    }

    #[test]
    fn transport_failures_map_to_unavailable() {
        let errors = vec![
            ChatError::Timeout(Duration::from_secs(3)),
            ChatError::Http {
                status: 401,
                message: "unauthorized".into(),
            },
            ChatError::Transport("connection reset".into()),
            ChatError::MalformedResponse("no choices".into()),
        ];
        for error in errors {
            let mapped = GenerationError::from_chat("llm", error);
            assert!(matches!(mapped, GenerationError::Unavailable { .. }));
        }
    }

    #[test]
    fn http_error_message_carries_status() {
        let err = ChatError::Http {
            status: 503,
            message: "overloaded".into(),
        };
        assert_eq!(err.to_string(), "chat request failed with status 503: overloaded");
    }
}
