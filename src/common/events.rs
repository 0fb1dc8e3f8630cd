use super::types::ChatMessage;

/// Events the session task sends back to the chat screen.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Full contents of the room, ascending by timestamp.
    Snapshot(Vec<ChatMessage>),
    /// The user's message reached the store; the input field can be cleared.
    Delivered,
    /// The send turn is over, successfully or not.
    SendFinished,
    /// Transient text to show the user.
    Notice(String),
}
