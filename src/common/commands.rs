/// Commands the chat screen sends to its session task.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Write the text as the local participant, then ask the completion API.
    Send(String),
}
