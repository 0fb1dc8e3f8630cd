use eframe::egui;

/// Returns `true` when the user asked to send non-empty text.
pub fn render(ui: &mut egui::Ui, input_text: &mut String, enabled: bool) -> bool {
    let mut send = false;
    ui.horizontal(|ui| {
        let send_width = 64.0;
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Message")
                .desired_width(ui.available_width() - send_width),
        );
        if ui.add_enabled(enabled, egui::Button::new("Send")).clicked() {
            send = true;
        }

        if enabled && response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    send && !input_text.is_empty()
}
