// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! New-product form: primary title plus one paged input per custom field.

use std::collections::BTreeMap;

use eframe::egui;

use crate::config::UiConfig;
use crate::models::field::FieldRegistry;
use crate::models::pagination::Paginator;
use crate::ui::components::field_input::{field_input, field_label, first_violation};
use crate::ui::components::{UiEvent, hint, pager_row};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProductFormModel {
    pub title: String,
    pub values: BTreeMap<String, String>,
    pub page: Paginator,
    pub busy: bool,
}

impl Default for ProductFormModel {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl ProductFormModel {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            title: String::new(),
            values: BTreeMap::new(),
            page: Paginator::new(config.form_page_size),
            busy: false,
        }
    }

    fn reset(&mut self) {
        self.title.clear();
        self.values.clear();
        self.page.reset();
    }

    /// Values for every registry field, blanks included.
    fn submission(&self, registry: &FieldRegistry) -> BTreeMap<String, String> {
        registry
            .fields()
            .iter()
            .map(|f| {
                let value = self
                    .values
                    .get(&f.field_name)
                    .map(|v| v.trim().to_string())
                    .unwrap_or_default();
                (f.field_name.clone(), value)
            })
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductFormMsg {
    TitleChanged(String),
    ValueChanged { key: String, value: String },
    PageStep(i8),
    Submit,
    Added(Result<(), String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductFormCommand {
    Add {
        title: String,
        values: BTreeMap<String, String>,
    },
    RefreshProducts,
}

pub fn update(
    model: &mut ProductFormModel,
    msg: ProductFormMsg,
    registry: &FieldRegistry,
    cmds: &mut Vec<ProductFormCommand>,
) -> Option<UiEvent> {
    match msg {
        ProductFormMsg::TitleChanged(title) => {
            model.title = title;
            None
        }
        ProductFormMsg::ValueChanged { key, value } => {
            model.values.insert(key, value);
            None
        }
        ProductFormMsg::PageStep(step) => {
            let len = registry.len();
            match step {
                s if s < 0 => model.page.prev(),
                s if s > 0 => model.page.next(len),
                _ => {}
            }
            None
        }
        ProductFormMsg::Submit => {
            if model.busy {
                return None;
            }
            if registry.is_empty() {
                return Some(UiEvent::error("No fields found."));
            }
            if model.title.trim().is_empty() {
                return Some(UiEvent::error("Primary title is required."));
            }
            if let Some(violation) = first_violation(registry.fields(), &model.values) {
                return Some(UiEvent::error(violation));
            }
            model.busy = true;
            cmds.push(ProductFormCommand::Add {
                title: model.title.trim().to_string(),
                values: model.submission(registry),
            });
            None
        }
        ProductFormMsg::Added(Ok(())) => {
            model.busy = false;
            model.reset();
            cmds.push(ProductFormCommand::RefreshProducts);
            Some(UiEvent::info("Product added successfully!"))
        }
        ProductFormMsg::Added(Err(err)) => {
            model.busy = false;
            Some(UiEvent::error(err))
        }
    }
}

pub fn view(ui: &mut egui::Ui, model: &ProductFormModel, registry: &FieldRegistry) -> Vec<ProductFormMsg> {
    let mut msgs = Vec::new();

    ui.heading("Add product");
    ui.add_space(6.0);

    ui.label(field_label("Primary title", true));
    let mut title = model.title.clone();
    if ui
        .add(egui::TextEdit::singleline(&mut title).desired_width(f32::INFINITY))
        .changed()
    {
        msgs.push(ProductFormMsg::TitleChanged(title));
    }
    ui.add_space(8.0);

    if registry.is_empty() {
        hint(ui, "No fields found.");
    } else {
        let fields: Vec<_> = registry.fields().iter().enumerate().collect();
        for (idx, field) in model.page.slice(&fields) {
            let key = &field.field_name;
            let value = model.values.get(key).map(String::as_str).unwrap_or("");
            if let Some(value) = field_input(
                ui,
                ("new_product", *idx),
                key,
                Some(*field),
                registry.widget(*idx),
                value,
            ) {
                msgs.push(ProductFormMsg::ValueChanged {
                    key: key.clone(),
                    value,
                });
            }
            ui.add_space(4.0);
        }
        match pager_row(ui, &model.page, registry.len()) {
            0 => {}
            step => msgs.push(ProductFormMsg::PageStep(step)),
        }
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                !model.busy,
                egui::Button::new(format!("{} Add product", egui_phosphor::regular::PLUS)),
            )
            .clicked()
        {
            msgs.push(ProductFormMsg::Submit);
        }
        if model.busy {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });

    msgs
}
