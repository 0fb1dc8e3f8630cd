use chrono::{DateTime, Utc};
use std::collections::VecDeque;

use crate::common::{ChatMessage, SessionEvent};
use crate::session::SessionPhase;

const NOTICE_LIFETIME_MS: i64 = 3500;
const MAX_NOTICES: usize = 4;

/// Local state of the name-entry screen.
#[derive(Debug, Default)]
pub struct EntryState {
    pub name_input: String,
}

/// Local state of the chat screen. `messages` is a cache of the last snapshot.
#[derive(Debug)]
pub struct ChatView {
    pub participant: String,
    pub messages: Vec<ChatMessage>,
    pub input_text: String,
    pub phase: SessionPhase,
    pub scroll_to_latest: bool,
}

impl ChatView {
    pub fn new(participant: impl Into<String>) -> Self {
        Self {
            participant: participant.into(),
            messages: Vec::new(),
            input_text: String::new(),
            phase: SessionPhase::Idle,
            scroll_to_latest: false,
        }
    }

    /// Folds a session event into the view; returns text to show as a notice.
    pub fn apply(&mut self, event: SessionEvent) -> Option<String> {
        match event {
            SessionEvent::Snapshot(messages) => {
                self.messages = messages;
                self.scroll_to_latest = true;
                None
            }
            SessionEvent::Delivered => {
                self.input_text.clear();
                None
            }
            SessionEvent::SendFinished => {
                if self.phase == SessionPhase::Sending {
                    self.phase = SessionPhase::Idle;
                }
                None
            }
            SessionEvent::Notice(text) => Some(text),
        }
    }

    /// Enters the sending phase if there is something to send.
    ///
    /// The text is not trimmed; whitespace-only input is sent as typed.
    pub fn begin_send(&mut self) -> Option<String> {
        if self.phase != SessionPhase::Idle || self.input_text.is_empty() {
            return None;
        }
        self.phase = SessionPhase::Sending;
        Some(self.input_text.clone())
    }

    pub fn can_send(&self) -> bool {
        self.phase == SessionPhase::Idle
    }
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub shown_at: DateTime<Utc>,
}

/// Short-lived messages shown over whichever screen is active.
#[derive(Debug, Default)]
pub struct Notices {
    items: VecDeque<Notice>,
}

impl Notices {
    pub fn push(&mut self, text: impl Into<String>) {
        self.push_at(text, Utc::now());
    }

    pub fn push_at(&mut self, text: impl Into<String>, now: DateTime<Utc>) {
        self.items.push_back(Notice {
            text: text.into(),
            shown_at: now,
        });
        while self.items.len() > MAX_NOTICES {
            self.items.pop_front();
        }
    }

    pub fn prune(&mut self, now: DateTime<Utc>) {
        self.items.retain(|notice| {
            now.signed_duration_since(notice.shown_at).num_milliseconds() < NOTICE_LIFETIME_MS
        });
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notice> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
