//! Error taxonomy for remote operations

use thiserror::Error;

/// Failures surfaced by remote queries, mutations, and dispatch routes
///
/// `OperationFailed` and `Transport` both land on the same user-visible
/// error-notification path; only the message text differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server returned an envelope with `success: false`
    #[error("{message}")]
    OperationFailed { message: String },

    /// The call failed before producing an envelope (network error,
    /// non-2xx response with no parseable body, malformed payload)
    #[error("{message}")]
    Transport { message: String },

    /// No remote route exists for this entity/action pair
    #[error("no {action} route registered for entity type '{kind}'")]
    UnsupportedAction { kind: String, action: String },
}

impl RemoteError {
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn unsupported(kind: impl Into<String>, action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            kind: kind.into(),
            action: action.into(),
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_through_display() {
        let err = RemoteError::operation_failed("Agent has active listings");
        assert_eq!(err.to_string(), "Agent has active listings");

        let err = RemoteError::transport("connection refused");
        assert_eq!(err.to_string(), "connection refused");
    }

    #[test]
    fn test_unsupported_action_is_descriptive() {
        let err = RemoteError::unsupported("contact", "approve");
        assert_eq!(
            err.to_string(),
            "no approve route registered for entity type 'contact'"
        );
    }
}
