use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your name")]
    EmptyName,
}

/// Failure reading from or writing to the message store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("failed to create database directory: {0}")]
    CreateDir(#[from] std::io::Error),
    #[error("store lock poisoned")]
    Poisoned,
    #[error("store task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("request failed: {code} {message}")]
    Http { code: u16, message: String },
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("unreadable completion response: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        CompletionError::Parse(err.to_string())
    }
}

/// Anything that can end a send turn early.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to write message: {0}")]
    Store(#[from] StoreError),
    #[error("failed to get a reply: {0}")]
    Completion(#[from] CompletionError),
}

impl SendError {
    /// Malformed or empty completion responses end the turn without telling the user.
    pub fn is_silent(&self) -> bool {
        matches!(self, SendError::Completion(CompletionError::Parse(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_parse_failures_are_silent() {
        let parse = SendError::from(CompletionError::Parse("no alternatives".into()));
        assert!(parse.is_silent());

        let http = SendError::from(CompletionError::Http {
            code: 500,
            message: "Internal Server Error".into(),
        });
        assert!(!http.is_silent());
        assert_eq!(
            http.to_string(),
            "failed to get a reply: request failed: 500 Internal Server Error"
        );

        assert!(!SendError::from(StoreError::Poisoned).is_silent());
    }
}
