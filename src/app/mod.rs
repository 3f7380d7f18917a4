// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Application entry point wiring egui/eframe to launch the pimdesk UI.

use eframe::egui;
use egui_phosphor::Variant;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::ui::PimDeskApp;

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run(config: AppConfig, client: ApiClient) -> eframe::Result<()> {
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("pimdesk")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "pimdesk",
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(PimDeskApp::new(&cc.egui_ctx, &config, client)))
        }),
    )
}
