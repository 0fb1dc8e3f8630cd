pub mod client;
pub mod protocol;

pub use client::CompletionClient;
pub use protocol::extract_reply;
