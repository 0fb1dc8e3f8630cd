pub mod controller;
pub mod entry;

pub use controller::{ChatSession, SessionRuntime};
pub use entry::{SessionHandle, begin};

/// Where a chat screen is in its send cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Sending,
    Terminal,
}
