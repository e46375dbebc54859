use thiserror::Error;

/// Errors produced by the engine and its collaborators.
///
/// None of these are fatal: transport errors are swallowed at the call
/// site, parse errors drop the offending record and task errors are
/// isolated by the queue.
#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum EngineError {
    // Debugging transport
    #[error("Debugger already attached to tab {tab_id}")]
    AlreadyAttached { tab_id: i64 },
    #[error("Debugger not attached to tab {tab_id}")]
    NotAttached { tab_id: i64 },
    #[error("Debugger command {method} failed for tab {tab_id}: {reason}")]
    CommandFailed {
        tab_id: i64,
        method: String,
        reason: String,
    },
    #[error("Debugging transport unavailable")]
    TransportUnavailable,

    // Queue
    #[error("Task was discarded before it started")]
    TaskDiscarded,
    #[error("Task panicked: {label}")]
    TaskPanicked { label: &'static str },
    #[error("Update queue is shut down")]
    QueueClosed,

    // Storage
    #[error("Cookie store error: {message}")]
    Store { message: String },

    // Payloads
    #[error("Invalid payload for {method}: {message}")]
    InvalidEvent { method: String, message: String },
    #[error("Invalid cookie dictionary: {message}")]
    InvalidDictionary { message: String },
}

impl EngineError {
    /// Create an invalid event error from a deserialization failure.
    pub fn invalid_event(method: impl Into<String>, err: &serde_json::Error) -> Self {
        Self::InvalidEvent {
            method: method.into(),
            message: err.to_string(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a command failure for a debugger method.
    pub fn command_failed(tab_id: i64, method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CommandFailed {
            tab_id,
            method: method.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error comes from the debugging transport.
    ///
    /// Transport errors are always swallowed by the dispatcher.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EngineError::AlreadyAttached { .. }
                | EngineError::NotAttached { .. }
                | EngineError::CommandFailed { .. }
                | EngineError::TransportUnavailable
        )
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::InvalidDictionary {
            message: err.to_string(),
        }
    }
}
