use eframe::egui;

/// Returns `true` when the user confirmed the typed name.
pub fn render(ui: &mut egui::Ui, name_input: &mut String) -> bool {
    let mut confirmed = false;
    ui.vertical_centered(|ui| {
        ui.add_space(ui.available_height() / 3.0);
        ui.heading("Room Chat");
        ui.add_space(12.0);
        ui.label("Your name");

        let response = ui.add(egui::TextEdit::singleline(name_input).hint_text("Name"));
        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            confirmed = true;
        }

        ui.add_space(8.0);
        if ui.button("Enter").clicked() {
            confirmed = true;
        }
    });
    confirmed
}
