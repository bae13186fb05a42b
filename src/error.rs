use thiserror::Error;

/// Failures raised while driving one chat turn.
///
/// `Transport` and `StreamEvent` are recovered at the submission boundary and
/// turned into the user-visible banner. `MalformedEvent` only ever reaches the
/// diagnostic log. `NoActiveTurn` and `TurnAlreadyActive` are programming
/// faults and abort the operation that hit them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    StreamEvent(String),
    #[error("malformed stream line ({reason}): {line}")]
    MalformedEvent { line: String, reason: String },
    #[error("no assistant turn is currently streaming")]
    NoActiveTurn,
    #[error("an assistant turn is already streaming")]
    TurnAlreadyActive,
}

impl ChatError {
    /// Banner text for errors the user is allowed to see.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::Transport(message) | Self::StreamEvent(message) => Some(message.clone()),
            _ => None,
        }
    }
}
