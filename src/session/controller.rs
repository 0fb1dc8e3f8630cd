use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::entry::SessionHandle;
use crate::common::{ChatMessage, NewMessage, RESPONDER_ID, SessionCommand, SessionEvent};
use crate::completion::CompletionClient;
use crate::error::{SendError, StoreError};
use crate::storage::{MessageStore, Subscription};

const COMMAND_BUFFER: usize = 100;

/// Keeps one chat screen in sync with the room and runs its send turns.
pub struct ChatSession {
    participant: String,
    store: Arc<dyn MessageStore>,
    completion: CompletionClient,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ChatSession {
    pub fn new(
        handle: SessionHandle,
        store: Arc<dyn MessageStore>,
        completion: CompletionClient,
        events: mpsc::UnboundedSender<SessionEvent>,
    ) -> Self {
        Self {
            participant: handle.participant().to_string(),
            store,
            completion,
            events,
        }
    }

    /// Moves the session onto the tokio runtime. Must be called inside one.
    pub fn spawn(self) -> SessionRuntime {
        let (commands, command_receiver) = mpsc::channel(COMMAND_BUFFER);
        let task = tokio::spawn(self.run(command_receiver));
        SessionRuntime { commands, task }
    }

    async fn run(self, mut commands: mpsc::Receiver<SessionCommand>) {
        log::info!("Chat session started for {}", self.participant);

        self.load_initial().await;
        let _subscription = self.subscribe();

        // Sends are handled one at a time, in arrival order.
        while let Some(command) = commands.recv().await {
            match command {
                SessionCommand::Send(text) => self.handle_send(text).await,
            }
        }

        log::info!("Chat session for {} closed", self.participant);
    }

    async fn load_initial(&self) {
        let store = Arc::clone(&self.store);
        let fetched = tokio::task::spawn_blocking(move || store.fetch_ordered())
            .await
            .map_err(StoreError::from)
            .and_then(|result| result);

        match fetched {
            Ok(messages) => self.emit(SessionEvent::Snapshot(messages)),
            Err(err) => {
                log::warn!("Initial message fetch failed: {err}");
                self.emit(SessionEvent::Notice(format!("Cannot load messages: {err}")));
            }
        }
    }

    fn subscribe(&self) -> Subscription {
        let snapshots = self.events.clone();
        let errors = self.events.clone();
        self.store.subscribe(
            Arc::new(move |messages: Vec<ChatMessage>| {
                let _ = snapshots.send(SessionEvent::Snapshot(messages));
            }),
            Arc::new(move |err: StoreError| {
                let _ = errors.send(SessionEvent::Notice(format!(
                    "Cannot receive new messages: {err}"
                )));
            }),
        )
    }

    async fn handle_send(&self, text: String) {
        if text.is_empty() {
            return;
        }

        match self.send_turn(&text).await {
            Ok(()) => {}
            Err(err) if err.is_silent() => {
                log::warn!("No reply appended: {err}");
            }
            Err(err) => {
                log::warn!("Send turn failed: {err}");
                self.emit(SessionEvent::Notice(err.to_string()));
            }
        }
        self.emit(SessionEvent::SendFinished);
    }

    /// Writes the user's message, then asks for and writes the reply.
    async fn send_turn(&self, text: &str) -> Result<(), SendError> {
        self.append(NewMessage::now(text, self.participant.as_str()))
            .await?;
        self.emit(SessionEvent::Delivered);

        let reply = self.completion.complete(text).await?;
        self.append(NewMessage::now(reply, RESPONDER_ID)).await?;
        Ok(())
    }

    async fn append(&self, message: NewMessage) -> Result<ChatMessage, StoreError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.append(message)).await?
    }

    fn emit(&self, event: SessionEvent) {
        if let Err(err) = self.events.send(event) {
            log::warn!("Chat screen no longer listening: {err}");
        }
    }
}

/// Handle the chat screen keeps for its session task.
///
/// Dropping it tears the session down: the subscription is cancelled and an
/// in-flight completion request is abandoned. Messages already written stay.
pub struct SessionRuntime {
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<()>,
}

impl SessionRuntime {
    /// Queues `text` for sending. Empty text is ignored and returns `false`.
    pub fn send(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        match self
            .commands
            .try_send(SessionCommand::Send(text.to_string()))
        {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Failed to queue message for sending: {err}");
                false
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub fn shutdown(self) {
        log::info!("Shutting down chat session");
    }
}

impl Drop for SessionRuntime {
    fn drop(&mut self) {
        self.task.abort();
    }
}
