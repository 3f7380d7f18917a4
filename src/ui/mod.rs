// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Top-level egui application shell.
//! Handles layout, navigation, the status bar, and wiring to the command workers.

pub mod components;

use std::time::Instant;

use eframe::egui;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::models::progress::StreamJob;
use crate::mvu::{self, AppModel, Command, Msg, Page};
use crate::ui::components::{
    auth, fields, product_form, products, progress, search, transfer,
};

/// Streams hold a worker for their whole duration, so keep a few spare.
const MIN_WORKERS: usize = 4;

/// What a worker thread reports back to the UI thread.
enum WorkerEvent {
    Msg(Msg),
    /// One command finished; used for the pending-work counter.
    Done,
}

/// Stateful egui application for the PIM backend.
pub struct PimDeskApp {
    model: AppModel,
    inbox: Vec<Msg>,
    cmd_tx: crossbeam_channel::Sender<Command>,
    event_rx: crossbeam_channel::Receiver<WorkerEvent>,
}

impl PimDeskApp {
    pub fn new(ctx: &egui::Context, config: &AppConfig, client: ApiClient) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (event_tx, event_rx) = crossbeam_channel::unbounded::<WorkerEvent>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().max(MIN_WORKERS))
            .unwrap_or(MIN_WORKERS);
        log::debug!("starting {threads} command workers against {}", client.base_url());
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let event_tx = event_tx.clone();
            let client = client.clone();
            let ctx = ctx.clone();
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    mvu::run_command(cmd, &client, &mut |msg| {
                        let _ = event_tx.send(WorkerEvent::Msg(msg));
                        ctx.request_repaint();
                    });
                    let _ = event_tx.send(WorkerEvent::Done);
                    ctx.request_repaint();
                }
            });
        }

        Self {
            model: AppModel::new(config),
            inbox: vec![
                Msg::Fields(fields::FieldsMsg::Refresh),
                Msg::Products(products::ProductsMsg::Refresh),
            ],
            cmd_tx,
            event_rx,
        }
    }
}

impl eframe::App for PimDeskApp {
    /// Drains worker output and runs pending messages through the MVU update.
    /// Also runs while the window is hidden, so results keep flowing.
    fn logic(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.ensure_spacing(ctx);

        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                WorkerEvent::Msg(msg) => self.inbox.push(msg),
                WorkerEvent::Done => {
                    self.model.pending_commands = self.model.pending_commands.saturating_sub(1)
                }
            }
        }

        self.expire_status(ctx);
        self.process_inbox();
    }

    fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        egui::Panel::top("top_bar").show_inside(ui, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading(format!("{} pimdesk", egui_phosphor::regular::STOREFRONT));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    egui::widgets::global_theme_preference_switch(ui);
                    if let Some(user) = self.model.session.username() {
                        ui.separator();
                        ui.label(format!("{} {user}", egui_phosphor::regular::USER));
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::Panel::bottom("status_panel")
            .resizable(false)
            .show_inside(ui, |ui| {
                self.render_status(ui);
            });

        egui::Panel::left("navigation")
            .resizable(false)
            .default_size(160.0)
            .show_inside(ui, |ui| {
                self.render_navigation(ui);
            });

        egui::CentralPanel::default().show_inside(ui, |ui| {
            ui.add_space(8.0);
            if self.model.page == Page::Products {
                self.render_page(ui);
            } else {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.render_page(ui));
            }
        });
    }
}

impl PimDeskApp {
    fn ensure_spacing(&self, ctx: &egui::Context) {
        ctx.global_style_mut(|style| {
            style.spacing.item_spacing = egui::vec2(6.0, 6.0);
        });
    }

    /// Apply queued messages in arrival order and hand the commands to the workers.
    fn process_inbox(&mut self) {
        let msgs = std::mem::take(&mut self.inbox);
        let mut commands = Vec::new();
        for msg in msgs {
            mvu::update(&mut self.model, msg, &mut commands);
        }
        for cmd in commands {
            if self.cmd_tx.send(cmd).is_ok() {
                self.model.pending_commands += 1;
            } else {
                log::error!("command workers are gone; dropping command");
            }
        }
    }

    fn expire_status(&mut self, ctx: &egui::Context) {
        if let Some(deadline) = self.model.status_deadline() {
            let now = Instant::now();
            if now >= deadline {
                self.inbox.push(Msg::StatusExpired);
            } else {
                ctx.request_repaint_after(deadline - now);
            }
        }
    }

    fn render_navigation(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        for page in Page::ALL {
            if matches!(page, Page::AiTheme | Page::Data) {
                ui.separator();
            }
            let label = format!("{} {}", page.icon(), page.label());
            if ui
                .selectable_label(self.model.page == page, label)
                .clicked()
                && self.model.page != page
            {
                self.inbox.push(Msg::Navigate(page));
            }
        }
    }

    fn render_page(&mut self, ui: &mut egui::Ui) {
        let model = &self.model;
        let registry = model.registry();
        match model.page {
            Page::Fields => {
                let msgs = fields::manage_view(ui, &model.fields);
                self.inbox.extend(msgs.into_iter().map(Msg::Fields));
            }
            Page::AddField => {
                let msgs = fields::add_view(ui, &model.fields);
                self.inbox.extend(msgs.into_iter().map(Msg::Fields));
            }
            Page::Products => {
                let msgs = products::view(ui, &model.products, registry);
                self.inbox.extend(msgs.into_iter().map(Msg::Products));
            }
            Page::AddProduct => {
                let msgs = product_form::view(ui, &model.product_form, registry);
                self.inbox.extend(msgs.into_iter().map(Msg::ProductForm));
            }
            Page::Search => {
                let msgs = search::view(ui, &model.search, registry);
                self.inbox.extend(msgs.into_iter().map(Msg::Search));
            }
            Page::AiTheme | Page::Translate => {
                let job = if model.page == Page::AiTheme {
                    StreamJob::ThemeDescriptions
                } else {
                    StreamJob::TranslateProducts
                };
                let msgs = progress::view(ui, model.job(job));
                self.inbox.extend(msgs.into_iter().map(|m| Msg::Job(job, m)));
            }
            Page::Data => {
                let msgs = transfer::view(ui, &model.transfer, &model.settings);
                self.inbox.extend(msgs.into_iter().map(Msg::Transfer));
            }
            Page::Account => {
                let msgs = auth::view(ui, &model.auth, &model.session);
                self.inbox.extend(msgs.into_iter().map(Msg::Auth));
            }
        }
    }

    /// Latest status message plus the background-work spinner.
    fn render_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(status) = &self.model.status {
                let color = if status.is_error {
                    egui::Color32::from_rgb(200, 80, 80)
                } else {
                    egui::Color32::from_rgb(70, 150, 90)
                };
                ui.label(egui::RichText::new(&status.text).color(color));
            }
            if self.model.pending_commands > 0 {
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.add(egui::Spinner::new().size(14.0)).on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
                });
            }
        });
    }
}
