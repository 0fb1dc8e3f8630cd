use crate::error::ValidationError;

/// Identity the chat screen runs under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    participant: String,
}

impl SessionHandle {
    pub fn participant(&self) -> &str {
        &self.participant
    }
}

/// Validates a display name typed on the entry screen.
pub fn begin(name: &str) -> Result<SessionHandle, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(SessionHandle {
        participant: trimmed.to_string(),
    })
}
