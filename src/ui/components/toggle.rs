// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! On/off switch used for boolean settings and the "required" flag.

use eframe::egui;

const KNOB_RADIUS: f32 = 6.5;

/// Switch bound to `on`. A click flips the value and marks the response changed.
pub fn toggle_switch(ui: &mut egui::Ui, on: &mut bool) -> egui::Response {
    let size = ui.spacing().interact_size.y * egui::vec2(1.9, 1.0);
    let (rect, mut response) = ui.allocate_exact_size(size, egui::Sense::click());
    if response.clicked() {
        *on = !*on;
        response.mark_changed();
    }
    response.widget_info(|| {
        egui::WidgetInfo::selected(egui::WidgetType::Checkbox, ui.is_enabled(), *on, "")
    });

    if ui.is_rect_visible(rect) {
        let t = ui.ctx().animate_bool_responsive(response.id, *on);
        let visuals = ui.style().interact_selectable(&response, *on);
        let off_fill = ui.visuals().widgets.inactive.bg_fill;
        let fill = off_fill.lerp_to_gamma(ui.visuals().selection.bg_fill, t);
        let radius = rect.height() / 2.0;

        let painter = ui.painter();
        painter.rect_filled(rect.expand(visuals.expansion), radius, fill);
        let knob_x = egui::lerp((rect.left() + radius)..=(rect.right() - radius), t);
        painter.circle(
            egui::pos2(knob_x, rect.center().y),
            KNOB_RADIUS.min(radius * 0.8),
            visuals.bg_fill,
            visuals.fg_stroke,
        );
    }

    response
}
