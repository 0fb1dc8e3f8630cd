pub mod commands;
pub mod events;
pub mod types;

pub use commands::SessionCommand;
pub use events::SessionEvent;
pub use types::{ChatMessage, NewMessage, RESPONDER_ID};
