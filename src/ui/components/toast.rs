use eframe::egui;

use crate::ui::state::Notices;

pub fn render(ctx: &egui::Context, notices: &Notices) {
    if notices.is_empty() {
        return;
    }

    egui::Area::new(egui::Id::new("notices"))
        .anchor(egui::Align2::CENTER_BOTTOM, egui::vec2(0.0, -56.0))
        .interactable(false)
        .show(ctx, |ui| {
            for notice in notices.visible() {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(&notice.text);
                });
                ui.add_space(4.0);
            }
        });
}
