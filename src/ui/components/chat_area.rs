use eframe::egui;

use crate::common::{ChatMessage, RESPONDER_ID};

pub fn render(
    ui: &mut egui::Ui,
    messages: &[ChatMessage],
    participant: &str,
    scroll_to_latest: bool,
) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            if messages.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
            }

            for message in messages {
                let color = if message.sender_id == RESPONDER_ID {
                    egui::Color32::LIGHT_BLUE
                } else if message.sender_id == participant {
                    egui::Color32::LIGHT_GREEN
                } else {
                    ui.visuals().text_color()
                };
                ui.colored_label(color, egui::RichText::new(&message.sender_id).strong());
                ui.label(&message.text);
                ui.add_space(6.0);
            }

            if scroll_to_latest {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });
}
