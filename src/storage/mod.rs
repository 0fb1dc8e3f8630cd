pub mod database;
pub mod memory;
pub mod sqlite_store;

pub use memory::MemoryStore;
pub use sqlite_store::SqliteStore;

use std::sync::Arc;

use crate::common::{ChatMessage, NewMessage};
use crate::error::StoreError;

/// Receives the full room contents, ascending by timestamp.
pub type SnapshotCallback = Arc<dyn Fn(Vec<ChatMessage>) + Send + Sync>;
/// Receives the error that stopped a subscription.
pub type ErrorCallback = Arc<dyn Fn(StoreError) + Send + Sync>;

/// An ordered, append-only message collection shared by every participant.
pub trait MessageStore: Send + Sync {
    /// One-shot read of the whole collection, ascending by timestamp.
    fn fetch_ordered(&self) -> Result<Vec<ChatMessage>, StoreError>;

    /// Writes `message` under a freshly generated id and returns the stored form.
    fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError>;

    /// Starts delivering snapshots, beginning with the current contents.
    ///
    /// After `on_error` fires the subscription delivers nothing more. Backends that
    /// poll spawn onto the ambient tokio runtime.
    fn subscribe(&self, on_snapshot: SnapshotCallback, on_error: ErrorCallback) -> Subscription;
}

/// Live-update registration; cancelled on [`Subscription::cancel`] or drop.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
