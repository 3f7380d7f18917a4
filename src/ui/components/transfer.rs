// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Data page: CSV import/export and the Shopify sync switches.

use eframe::egui;

use crate::config::Settings;
use crate::ui::components::{UiEvent, hint, toggle_switch};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferModel {
    pub uploading: bool,
    pub downloading: bool,
    pub refreshing: bool,
    pub last_upload: Option<String>,
    pub last_download: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferMsg {
    UploadRequested,
    /// `Ok(None)` when the file picker was dismissed.
    UploadFinished(Result<Option<String>, String>),
    DownloadRequested,
    /// Saved path on success; `Ok(None)` when the picker was dismissed.
    DownloadFinished(Result<Option<String>, String>),
    ShopifyToggled(bool),
    ShopifySaved(Result<(), String>),
    RefreshShopify,
    Refreshed(Result<(), String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TransferCommand {
    PickAndUpload,
    PickAndDownload,
    SetShopify(bool),
    RefreshShopify,
    RefreshProducts,
}

pub fn update(
    model: &mut TransferModel,
    msg: TransferMsg,
    settings: &mut Settings,
    cmds: &mut Vec<TransferCommand>,
) -> Option<UiEvent> {
    match msg {
        TransferMsg::UploadRequested => {
            if model.uploading {
                return None;
            }
            model.uploading = true;
            cmds.push(TransferCommand::PickAndUpload);
            None
        }
        TransferMsg::UploadFinished(result) => {
            model.uploading = false;
            match result {
                Ok(None) => None,
                Ok(Some(name)) => {
                    model.last_upload = Some(name);
                    cmds.push(TransferCommand::RefreshProducts);
                    Some(UiEvent::info("Upload successful!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        TransferMsg::DownloadRequested => {
            if model.downloading {
                return None;
            }
            model.downloading = true;
            cmds.push(TransferCommand::PickAndDownload);
            None
        }
        TransferMsg::DownloadFinished(result) => {
            model.downloading = false;
            match result {
                Ok(None) => None,
                Ok(Some(path)) => {
                    let event = UiEvent::info(format!("Saved {path}"));
                    model.last_download = Some(path);
                    Some(event)
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        TransferMsg::ShopifyToggled(on) => {
            settings.set_shopify_sync(on);
            cmds.push(TransferCommand::SetShopify(on));
            None
        }
        TransferMsg::ShopifySaved(Ok(())) => {
            if settings.shopify_sync() {
                Some(UiEvent::info("Shopify sync enabled"))
            } else {
                Some(UiEvent::info("Shopify sync disabled"))
            }
        }
        TransferMsg::ShopifySaved(Err(err)) => {
            log::warn!("shopify toggle not saved on server: {err}");
            Some(UiEvent::info("Shopify toggle saved (local)"))
        }
        TransferMsg::RefreshShopify => {
            if model.refreshing {
                return None;
            }
            model.refreshing = true;
            cmds.push(TransferCommand::RefreshShopify);
            None
        }
        TransferMsg::Refreshed(result) => {
            model.refreshing = false;
            match result {
                Ok(()) => {
                    cmds.push(TransferCommand::RefreshProducts);
                    Some(UiEvent::info("Products & categories refreshed from Shopify!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
    }
}

pub fn view(ui: &mut egui::Ui, model: &TransferModel, settings: &Settings) -> Vec<TransferMsg> {
    let mut msgs = Vec::new();

    ui.heading("Data");
    ui.add_space(6.0);

    ui.group(|ui| {
        ui.strong("CSV");
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    !model.uploading,
                    egui::Button::new(format!("{} Upload CSV", egui_phosphor::regular::UPLOAD_SIMPLE)),
                )
                .clicked()
            {
                msgs.push(TransferMsg::UploadRequested);
            }
            if model.uploading {
                ui.add(egui::Spinner::new().size(14.0));
            }
        });
        if let Some(name) = &model.last_upload {
            hint(ui, &format!("Last upload: {name}"));
        }
        ui.add_space(4.0);
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    !model.downloading,
                    egui::Button::new(format!(
                        "{} Download CSV",
                        egui_phosphor::regular::DOWNLOAD_SIMPLE
                    )),
                )
                .clicked()
            {
                msgs.push(TransferMsg::DownloadRequested);
            }
            if model.downloading {
                ui.add(egui::Spinner::new().size(14.0));
            }
        });
        if let Some(path) = &model.last_download {
            hint(ui, &format!("Last download: {path}"));
        }
    });

    ui.add_space(8.0);
    ui.group(|ui| {
        ui.strong("Shopify");
        ui.horizontal(|ui| {
            let mut on = settings.shopify_sync();
            if toggle_switch(ui, &mut on).changed() {
                msgs.push(TransferMsg::ShopifyToggled(on));
            }
            ui.label("Sync with Shopify");
        });
        ui.horizontal(|ui| {
            if ui
                .add_enabled(
                    !model.refreshing,
                    egui::Button::new(format!(
                        "{} Refresh from Shopify",
                        egui_phosphor::regular::ARROWS_CLOCKWISE
                    )),
                )
                .clicked()
            {
                msgs.push(TransferMsg::RefreshShopify);
            }
            if model.refreshing {
                ui.add(egui::Spinner::new().size(14.0));
            }
        });
    });

    msgs
}
