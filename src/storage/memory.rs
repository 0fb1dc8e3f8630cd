use std::sync::{Arc, Mutex, Weak};
use uuid::Uuid;

use super::{ErrorCallback, MessageStore, SnapshotCallback, Subscription};
use crate::common::{ChatMessage, NewMessage};
use crate::error::StoreError;

#[derive(Default)]
struct RoomState {
    messages: Vec<ChatMessage>,
    subscribers: Vec<(u64, SnapshotCallback)>,
    next_subscriber: u64,
}

/// In-process room that pushes a snapshot to every subscriber on each append.
///
/// Callbacks run synchronously on the appending thread and must not call back
/// into the store.
#[derive(Default, Clone)]
pub struct MemoryStore {
    state: Arc<Mutex<RoomState>>,
    // Held across the callbacks so snapshots reach subscribers in the order
    // they were taken. Always locked before `state`.
    delivery: Arc<Mutex<()>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.subscribers.len())
            .unwrap_or(0)
    }
}

impl MessageStore for MemoryStore {
    fn fetch_ordered(&self) -> Result<Vec<ChatMessage>, StoreError> {
        let state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(state.messages.clone())
    }

    fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let stored = message.into_message(Uuid::new_v4().to_string());

        let _delivery = self.delivery.lock().map_err(|_| StoreError::Poisoned)?;
        let (snapshot, subscribers) = {
            let mut state = self.state.lock().map_err(|_| StoreError::Poisoned)?;
            // Equal timestamps keep insertion order.
            let at = state
                .messages
                .partition_point(|existing| existing.timestamp <= stored.timestamp);
            state.messages.insert(at, stored.clone());
            let subscribers: Vec<_> = state
                .subscribers
                .iter()
                .map(|(_, callback)| Arc::clone(callback))
                .collect();
            (state.messages.clone(), subscribers)
        };

        for callback in subscribers {
            callback(snapshot.clone());
        }
        Ok(stored)
    }

    fn subscribe(&self, on_snapshot: SnapshotCallback, on_error: ErrorCallback) -> Subscription {
        let Ok(_delivery) = self.delivery.lock() else {
            on_error(StoreError::Poisoned);
            return Subscription::new(|| {});
        };
        let registered = self.state.lock().map(|mut state| {
            let key = state.next_subscriber;
            state.next_subscriber += 1;
            state.subscribers.push((key, Arc::clone(&on_snapshot)));
            (key, state.messages.clone())
        });

        let (key, current) = match registered {
            Ok(registered) => registered,
            Err(_) => {
                on_error(StoreError::Poisoned);
                return Subscription::new(|| {});
            }
        };
        on_snapshot(current);

        let state: Weak<Mutex<RoomState>> = Arc::downgrade(&self.state);
        Subscription::new(move || {
            if let Some(state) = state.upgrade() {
                if let Ok(mut state) = state.lock() {
                    state.subscribers.retain(|(existing, _)| *existing != key);
                }
            }
        })
    }
}
