// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Reusable egui components structured for MVU-style updates.

pub mod auth;
pub mod confirm;
pub mod field_input;
pub mod fields;
pub mod product_editor;
pub mod product_form;
pub mod products;
pub mod progress;
pub mod search;
pub mod toggle;
pub mod transfer;

pub use toggle::toggle_switch;

/// Feedback a component hands to the status bar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UiEvent {
    pub message: String,
    pub is_error: bool,
}

impl UiEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// Muted helper text used under section headings.
pub(crate) fn hint(ui: &mut eframe::egui::Ui, text: &str) {
    ui.label(
        eframe::egui::RichText::new(text)
            .small()
            .color(eframe::egui::Color32::from_gray(110)),
    );
}

/// Prev / "Page N of M" / Next row. Returns -1, 0 or 1 for the requested move.
pub(crate) fn pager_row(
    ui: &mut eframe::egui::Ui,
    pager: &crate::models::pagination::Paginator,
    len: usize,
) -> i8 {
    let mut step = 0;
    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                pager.can_prev(),
                eframe::egui::Button::new(egui_phosphor::regular::CARET_LEFT),
            )
            .on_hover_text("Previous page")
            .clicked()
        {
            step = -1;
        }
        ui.label(pager.label(len));
        if ui
            .add_enabled(
                pager.can_next(len),
                eframe::egui::Button::new(egui_phosphor::regular::CARET_RIGHT),
            )
            .on_hover_text("Next page")
            .clicked()
        {
            step = 1;
        }
    });
    step
}

/// Move `pager` one page back (negative), forward (positive) or not at all.
pub(crate) fn step_pager(pager: &mut crate::models::pagination::Paginator, step: i8, len: usize) {
    match step {
        s if s < 0 => pager.prev(),
        s if s > 0 => pager.next(len),
        _ => {}
    }
}
