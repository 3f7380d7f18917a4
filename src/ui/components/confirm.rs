// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Centered yes/no confirmation window.

use eframe::egui;

/// Outcome of a confirmation prompt for this frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

/// Show a modal-style confirmation window. Returns the choice once clicked.
pub fn confirm_dialog(
    ctx: &egui::Context,
    title: &str,
    message: &str,
    confirm_label: &str,
) -> Option<Confirmation> {
    let mut choice = None;
    egui::Window::new(title)
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            ui.label(message);
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .button(format!("{} {confirm_label}", egui_phosphor::regular::TRASH))
                    .clicked()
                {
                    choice = Some(Confirmation::Confirmed);
                }
                if ui.button("Cancel").clicked() {
                    choice = Some(Confirmation::Cancelled);
                }
            });
        });
    choice
}
