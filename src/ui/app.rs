use chrono::Utc;
use eframe::egui;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::common::SessionEvent;
use crate::completion::CompletionClient;
use crate::session::{self, ChatSession, SessionHandle, SessionPhase, SessionRuntime};
use crate::storage::MessageStore;

use super::components::{chat_area, input_bar, name_entry, toast};
use super::state::{ChatView, EntryState, Notices};

/// Background events can arrive without user input; poll for them at this rate.
const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

enum Screen {
    Entry(EntryState),
    Chat(ChatScreen),
}

enum Transition {
    OpenChat(SessionHandle),
    Leave,
}

pub struct ChatApp {
    screen: Screen,
    notices: Notices,
    runtime: Handle,
    store: Arc<dyn MessageStore>,
    completion: CompletionClient,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        runtime: Handle,
        store: Arc<dyn MessageStore>,
        completion: CompletionClient,
        initial_name: Option<String>,
    ) -> Self {
        let mut app = Self {
            screen: Screen::Entry(EntryState::default()),
            notices: Notices::default(),
            runtime,
            store,
            completion,
        };

        if let Some(name) = initial_name {
            match session::begin(&name) {
                Ok(handle) => app.open_chat(handle),
                Err(err) => {
                    app.notices.push(err.to_string());
                    app.screen = Screen::Entry(EntryState { name_input: name });
                }
            }
        }
        app
    }

    fn open_chat(&mut self, handle: SessionHandle) {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        let chat_session = ChatSession::new(
            handle.clone(),
            Arc::clone(&self.store),
            self.completion.clone(),
            event_sender,
        );
        let runtime = {
            let _guard = self.runtime.enter();
            chat_session.spawn()
        };
        self.screen = Screen::Chat(ChatScreen::new(&handle, runtime, event_receiver));
    }

    fn leave_chat(&mut self) {
        let previous = std::mem::replace(&mut self.screen, Screen::Entry(EntryState::default()));
        if let Screen::Chat(chat) = previous {
            chat.runtime.shutdown();
        }
    }
}

fn update_entry(
    ctx: &egui::Context,
    entry: &mut EntryState,
    notices: &mut Notices,
) -> Option<Transition> {
    let mut transition = None;
    egui::CentralPanel::default().show(ctx, |ui| {
        if name_entry::render(ui, &mut entry.name_input) {
            match session::begin(&entry.name_input) {
                Ok(handle) => transition = Some(Transition::OpenChat(handle)),
                Err(err) => notices.push(err.to_string()),
            }
        }
    });
    transition
}

struct ChatScreen {
    view: ChatView,
    runtime: SessionRuntime,
    event_receiver: mpsc::UnboundedReceiver<SessionEvent>,
}

impl ChatScreen {
    fn new(
        handle: &SessionHandle,
        runtime: SessionRuntime,
        event_receiver: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Self {
        Self {
            view: ChatView::new(handle.participant()),
            runtime,
            event_receiver,
        }
    }

    fn handle_session_events(&mut self, notices: &mut Notices) {
        while let Ok(event) = self.event_receiver.try_recv() {
            if let Some(text) = self.view.apply(event) {
                notices.push(text);
            }
        }

        if self.view.phase != SessionPhase::Terminal && self.runtime.is_finished() {
            log::error!("Chat session task ended unexpectedly");
            self.view.phase = SessionPhase::Terminal;
            notices.push("Chat session stopped; re-enter the room to reconnect");
        }
    }

    fn send_input(&mut self) {
        if let Some(text) = self.view.begin_send() {
            if !self.runtime.send(&text) {
                self.view.phase = SessionPhase::Idle;
            }
        }
    }

    fn update(&mut self, ctx: &egui::Context, notices: &mut Notices) -> Option<Transition> {
        self.handle_session_events(notices);
        let mut transition = None;

        egui::TopBottomPanel::top("chat_header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Room Chat");
                ui.label(egui::RichText::new(format!("as {}", self.view.participant)).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Leave").clicked() {
                        transition = Some(Transition::Leave);
                    }
                    if self.view.phase == SessionPhase::Sending {
                        ui.spinner();
                    }
                });
            });
        });

        let can_send = self.view.can_send();
        egui::TopBottomPanel::bottom("chat_input").show(ctx, |ui| {
            ui.add_space(4.0);
            if input_bar::render(ui, &mut self.view.input_text, can_send) {
                self.send_input();
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            chat_area::render(
                ui,
                &self.view.messages,
                &self.view.participant,
                self.view.scroll_to_latest,
            );
        });
        self.view.scroll_to_latest = false;

        transition
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.notices.prune(Utc::now());

        let transition = match &mut self.screen {
            Screen::Entry(entry) => update_entry(ctx, entry, &mut self.notices),
            Screen::Chat(chat) => chat.update(ctx, &mut self.notices),
        };

        match transition {
            Some(Transition::OpenChat(handle)) => self.open_chat(handle),
            Some(Transition::Leave) => self.leave_chat(),
            None => {}
        }

        toast::render(ctx, &self.notices);
        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
