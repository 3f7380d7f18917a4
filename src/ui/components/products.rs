// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Product table with filtering, paging, bulk actions and the edit modal.

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::api::types::{BulkEdit, ProductRef, ProductUpdate};
use crate::config::UiConfig;
use crate::models::field::FieldRegistry;
use crate::models::pagination::Paginator;
use crate::models::record::{Record, locate};
use crate::models::selection::{SelectAllState, Selection};
use crate::ui::components::confirm::{Confirmation, confirm_dialog};
use crate::ui::components::product_editor::{self, EditMsg, EditSession};
use crate::ui::components::{UiEvent, hint, pager_row, step_pager};

/// What the open confirmation window is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PendingConfirm {
    BulkDelete(Vec<usize>),
    Delete { index: usize, label: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkDraft {
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductsModel {
    products: Vec<Record>,
    pub loading: bool,
    pub filter: String,
    /// `None` shows every group.
    pub group: Option<String>,
    pub page: Paginator,
    pub columns: Paginator,
    pub selection: Selection,
    pub bulk: BulkDraft,
    pub confirm: Option<PendingConfirm>,
    pub edit: Option<EditSession>,
    pub busy: bool,
    form_page_size: usize,
}

impl Default for ProductsModel {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl ProductsModel {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            products: Vec::new(),
            loading: false,
            filter: String::new(),
            group: None,
            page: Paginator::new(config.products_per_page),
            columns: Paginator::new(config.fields_per_page),
            selection: Selection::default(),
            bulk: BulkDraft::default(),
            confirm: None,
            edit: None,
            busy: false,
            form_page_size: config.form_page_size,
        }
    }

    pub fn products(&self) -> &[Record] {
        &self.products
    }

    /// Indices of products matching the filter, in cache order.
    pub fn filtered_indices(&self) -> Vec<usize> {
        self.products
            .iter()
            .enumerate()
            .filter(|(_, p)| p.matches_query(&self.filter))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Indices on the current page.
    pub fn page_indices(&self) -> Vec<usize> {
        self.page.slice(&self.filtered_indices()).to_vec()
    }

    pub fn select_all_state(&self) -> SelectAllState {
        self.selection.state_for(&self.filtered_indices())
    }

    /// Row and bulk actions wait while a request is in flight or the editor is open.
    pub fn locked(&self) -> bool {
        self.busy || self.edit.is_some()
    }

    /// Point the open editor at its record in the current cache, or close it.
    fn reconcile_edit(&mut self) -> Option<UiEvent> {
        let session = self.edit.as_mut()?;
        match session.relocate(&self.products) {
            Some(pos) => {
                session.index = pos;
                None
            }
            None => {
                log::info!("closing editor; product at {} is gone", session.index);
                self.edit = None;
                Some(UiEvent::error("The product being edited changed or was removed."))
            }
        }
    }
}

/// Field names in the selected group (or every field), before column windowing.
pub fn group_columns<'a>(registry: &'a FieldRegistry, group: Option<&str>) -> Vec<&'a str> {
    match group {
        Some(name) => registry
            .grouped()
            .get(name)
            .map(|fields| fields.iter().map(|f| f.field_name.as_str()).collect())
            .unwrap_or_default(),
        None => registry
            .grouped()
            .flatten()
            .into_iter()
            .map(|f| f.field_name.as_str())
            .collect(),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductsMsg {
    Refresh,
    Loaded(Result<Vec<Record>, String>),
    FilterChanged(String),
    GroupChanged(Option<String>),
    PageStep(i8),
    ColumnStep(i8),
    ToggleRow(usize),
    ToggleAllVisible,
    BulkFieldChanged(String),
    BulkValueChanged(String),
    ApplyBulkEdit,
    BulkEdited(Result<(), String>),
    RequestBulkDelete,
    RequestDelete(usize),
    ConfirmPending,
    CancelPending,
    BulkDeleted(Result<(), String>),
    Deleted {
        target: ProductRef,
        result: Result<(), String>,
    },
    OpenEdit(usize),
    Edit(EditMsg),
    Updated {
        update: ProductUpdate,
        result: Result<(), String>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductsCommand {
    Load,
    Update(ProductUpdate),
    Delete(ProductRef),
    BulkEdit(BulkEdit),
    BulkDelete(Vec<usize>),
}

fn product_ref(record: &Record, index: usize) -> ProductRef {
    match record.identifier() {
        Some(id) => ProductRef::Id(id),
        None => ProductRef::Index(index),
    }
}

fn resolve(products: &[Record], target: &ProductRef) -> Option<usize> {
    match target {
        ProductRef::Id(id) => locate(products, id),
        ProductRef::Index(index) => (*index < products.len()).then_some(*index),
    }
}

pub fn update(
    model: &mut ProductsModel,
    msg: ProductsMsg,
    registry: &FieldRegistry,
    cmds: &mut Vec<ProductsCommand>,
) -> Option<UiEvent> {
    match msg {
        ProductsMsg::Refresh => {
            model.loading = true;
            cmds.push(ProductsCommand::Load);
            None
        }
        ProductsMsg::Loaded(Ok(products)) => {
            model.loading = false;
            model.products = products;
            model.selection.retain_below(model.products.len());
            let len = model.filtered_indices().len();
            model.page.clamp(len);
            model.reconcile_edit()
        }
        ProductsMsg::Loaded(Err(err)) => {
            model.loading = false;
            Some(UiEvent::error(err))
        }
        ProductsMsg::FilterChanged(text) => {
            model.filter = text;
            model.page.reset();
            None
        }
        ProductsMsg::GroupChanged(group) => {
            model.group = group;
            model.columns.reset();
            model.page.reset();
            None
        }
        ProductsMsg::PageStep(step) => {
            let len = model.filtered_indices().len();
            step_pager(&mut model.page, step, len);
            None
        }
        ProductsMsg::ColumnStep(step) => {
            let len = group_columns(registry, model.group.as_deref()).len();
            step_pager(&mut model.columns, step, len);
            None
        }
        ProductsMsg::ToggleRow(index) => {
            if index < model.products.len() {
                model.selection.toggle(index);
            }
            None
        }
        ProductsMsg::ToggleAllVisible => {
            let visible = model.filtered_indices();
            model.selection.toggle_all(&visible);
            None
        }
        ProductsMsg::BulkFieldChanged(field) => {
            model.bulk.field = field;
            None
        }
        ProductsMsg::BulkValueChanged(value) => {
            model.bulk.value = value;
            None
        }
        ProductsMsg::ApplyBulkEdit => {
            if model.locked() {
                return None;
            }
            if model.selection.is_empty() {
                return Some(UiEvent::error("No products selected."));
            }
            if model.bulk.field.trim().is_empty() {
                return Some(UiEvent::error("Choose a field to edit."));
            }
            model.busy = true;
            cmds.push(ProductsCommand::BulkEdit(BulkEdit {
                indices: model.selection.indices(),
                field: model.bulk.field.trim().to_string(),
                value: model.bulk.value.clone(),
            }));
            None
        }
        ProductsMsg::BulkEdited(result) => {
            model.busy = false;
            match result {
                Ok(()) => {
                    model.loading = true;
                    cmds.push(ProductsCommand::Load);
                    Some(UiEvent::info("Edited selected products."))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        ProductsMsg::RequestBulkDelete => {
            if model.locked() {
                return None;
            }
            if model.selection.is_empty() {
                return Some(UiEvent::error("No products selected."));
            }
            model.confirm = Some(PendingConfirm::BulkDelete(model.selection.indices()));
            None
        }
        ProductsMsg::RequestDelete(index) => {
            if model.locked() {
                return None;
            }
            if let Some(record) = model.products.get(index) {
                model.confirm = Some(PendingConfirm::Delete {
                    index,
                    label: record.display_name(),
                });
            }
            None
        }
        ProductsMsg::CancelPending => {
            model.confirm = None;
            None
        }
        ProductsMsg::ConfirmPending => {
            if model.locked() {
                model.confirm = None;
                return None;
            }
            match model.confirm.take()? {
                PendingConfirm::BulkDelete(indices) => {
                    model.busy = true;
                    cmds.push(ProductsCommand::BulkDelete(indices));
                }
                PendingConfirm::Delete { index, .. } => {
                    let record = model.products.get(index)?;
                    model.busy = true;
                    cmds.push(ProductsCommand::Delete(product_ref(record, index)));
                }
            }
            None
        }
        ProductsMsg::BulkDeleted(result) => {
            model.busy = false;
            match result {
                Ok(()) => {
                    model.selection.clear();
                    model.loading = true;
                    cmds.push(ProductsCommand::Load);
                    Some(UiEvent::info("Deleted selected products."))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        ProductsMsg::Deleted { target, result } => {
            model.busy = false;
            match result {
                Ok(()) => {
                    match resolve(&model.products, &target) {
                        Some(pos) => {
                            model.products.remove(pos);
                            model.selection.remove_index(pos);
                        }
                        None => log::warn!("deleted product {target:?} not found in cache"),
                    }
                    let len = model.filtered_indices().len();
                    model.page.clamp(len);
                    model
                        .reconcile_edit()
                        .or(Some(UiEvent::info("Product deleted!")))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        ProductsMsg::OpenEdit(index) => {
            if model.locked() {
                return None;
            }
            if let Some(record) = model.products.get(index) {
                model.edit = Some(EditSession::open(
                    index,
                    record,
                    registry,
                    model.form_page_size,
                ));
            }
            None
        }
        ProductsMsg::Edit(EditMsg::Cancel) => {
            model.edit = None;
            None
        }
        ProductsMsg::Edit(EditMsg::Save) => {
            let session = model.edit.as_mut()?;
            if session.saving {
                return None;
            }
            match session.pending_changes(registry) {
                Ok(changes) => {
                    session.saving = true;
                    cmds.push(ProductsCommand::Update(session.update_body(changes)));
                    None
                }
                Err(event) => Some(event),
            }
        }
        ProductsMsg::Edit(msg) => {
            if let Some(session) = model.edit.as_mut() {
                product_editor::update(session, msg);
            }
            None
        }
        ProductsMsg::Updated { update, result } => match result {
            Ok(()) => {
                let position = match &update {
                    ProductUpdate::Keyed { id, .. } => locate(&model.products, id),
                    // The cache may have been reloaded while saving; the session knows where the record went.
                    ProductUpdate::Legacy { index, .. } => match &model.edit {
                        Some(session) => session.relocate(&model.products),
                        None => (*index < model.products.len()).then_some(*index),
                    },
                };
                match position.and_then(|pos| model.products.get_mut(pos)) {
                    Some(record) => record.apply_updates(update.updates()),
                    None => log::warn!("updated product not found in cache; it will show after reload"),
                }
                model.edit = None;
                Some(UiEvent::info("Product updated!"))
            }
            Err(err) => {
                if let Some(session) = model.edit.as_mut() {
                    session.saving = false;
                }
                Some(UiEvent::error(err))
            }
        },
    }
}

pub fn view(ui: &mut egui::Ui, model: &ProductsModel, registry: &FieldRegistry) -> Vec<ProductsMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        ui.heading("Products");
        if ui
            .add_enabled(
                !model.loading,
                egui::Button::new(egui_phosphor::regular::ARROWS_CLOCKWISE),
            )
            .on_hover_text("Reload products")
            .clicked()
        {
            msgs.push(ProductsMsg::Refresh);
        }
        if model.loading {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });
    ui.add_space(6.0);

    render_toolbar(ui, model, registry, &mut msgs);
    ui.add_space(6.0);
    render_bulk_bar(ui, model, registry, &mut msgs);
    ui.add_space(6.0);

    let filtered = model.filtered_indices();
    if filtered.is_empty() {
        hint(ui, "No products to show.");
    } else {
        render_table(ui, model, registry, &mut msgs);
        ui.add_space(4.0);
        match pager_row(ui, &model.page, filtered.len()) {
            0 => {}
            step => msgs.push(ProductsMsg::PageStep(step)),
        }
    }

    if let Some(session) = &model.edit {
        let edits = product_editor::view(ui.ctx(), session, registry);
        msgs.extend(edits.into_iter().map(ProductsMsg::Edit));
    }
    if let Some(pending) = &model.confirm {
        let message = match pending {
            PendingConfirm::BulkDelete(indices) => {
                format!("Delete {} selected product(s)?", indices.len())
            }
            PendingConfirm::Delete { label, .. } => format!("Delete '{label}'?"),
        };
        match confirm_dialog(ui.ctx(), "Confirm delete", &message, "Delete") {
            Some(Confirmation::Confirmed) => msgs.push(ProductsMsg::ConfirmPending),
            Some(Confirmation::Cancelled) => msgs.push(ProductsMsg::CancelPending),
            None => {}
        }
    }

    msgs
}

fn render_toolbar(
    ui: &mut egui::Ui,
    model: &ProductsModel,
    registry: &FieldRegistry,
    msgs: &mut Vec<ProductsMsg>,
) {
    ui.horizontal(|ui| {
        let mut filter = model.filter.clone();
        if ui
            .add(
                egui::TextEdit::singleline(&mut filter)
                    .hint_text(format!("{} Search products", egui_phosphor::regular::MAGNIFYING_GLASS))
                    .desired_width(240.0),
            )
            .changed()
        {
            msgs.push(ProductsMsg::FilterChanged(filter));
        }

        ui.label("Group");
        egui::ComboBox::from_id_salt("product_group")
            .selected_text(model.group.as_deref().unwrap_or("All"))
            .show_ui(ui, |ui| {
                if ui.selectable_label(model.group.is_none(), "All").clicked() {
                    msgs.push(ProductsMsg::GroupChanged(None));
                }
                for name in registry.grouped().names() {
                    if ui
                        .selectable_label(model.group.as_deref() == Some(name), name)
                        .clicked()
                    {
                        msgs.push(ProductsMsg::GroupChanged(Some(name.to_string())));
                    }
                }
            });

        let total = group_columns(registry, model.group.as_deref()).len();
        if total > model.columns.page_size() {
            ui.separator();
            ui.label("Columns");
            match pager_row(ui, &model.columns, total) {
                0 => {}
                step => msgs.push(ProductsMsg::ColumnStep(step)),
            }
        }
    });
}

fn render_bulk_bar(
    ui: &mut egui::Ui,
    model: &ProductsModel,
    registry: &FieldRegistry,
    msgs: &mut Vec<ProductsMsg>,
) {
    ui.horizontal(|ui| {
        ui.label(format!("{} selected", model.selection.len()));
        ui.separator();

        let shown = if model.bulk.field.is_empty() {
            "Choose field"
        } else {
            model.bulk.field.as_str()
        };
        egui::ComboBox::from_id_salt("bulk_field")
            .selected_text(shown)
            .show_ui(ui, |ui| {
                for (group, fields) in registry.grouped().iter() {
                    ui.label(egui::RichText::new(group).strong());
                    for field in fields {
                        if ui
                            .selectable_label(model.bulk.field == field.field_name, &field.field_name)
                            .clicked()
                        {
                            msgs.push(ProductsMsg::BulkFieldChanged(field.field_name.clone()));
                        }
                    }
                }
            });

        let mut value = model.bulk.value.clone();
        if ui
            .add(
                egui::TextEdit::singleline(&mut value)
                    .hint_text("New value")
                    .desired_width(160.0),
            )
            .changed()
        {
            msgs.push(ProductsMsg::BulkValueChanged(value));
        }

        let has_selection = !model.selection.is_empty();
        if ui
            .add_enabled(
                has_selection && !model.locked(),
                egui::Button::new(format!("{} Apply", egui_phosphor::regular::PENCIL_SIMPLE)),
            )
            .clicked()
        {
            msgs.push(ProductsMsg::ApplyBulkEdit);
        }
        if ui
            .add_enabled(
                has_selection && !model.locked(),
                egui::Button::new(format!("{} Delete selected", egui_phosphor::regular::TRASH)),
            )
            .clicked()
        {
            msgs.push(ProductsMsg::RequestBulkDelete);
        }
    });
}

fn render_table(
    ui: &mut egui::Ui,
    model: &ProductsModel,
    registry: &FieldRegistry,
    msgs: &mut Vec<ProductsMsg>,
) {
    let all_columns = group_columns(registry, model.group.as_deref());
    let columns = model.columns.slice(&all_columns);
    let rows = model.page_indices();
    let state = model.select_all_state();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::exact(28.0))
        .column(Column::initial(200.0).at_least(80.0).clip(true))
        .columns(Column::initial(120.0).at_least(60.0).clip(true), columns.len())
        .column(Column::exact(64.0))
        .header(22.0, |mut header| {
            header.col(|ui| {
                let mut all = state == SelectAllState::All;
                let checkbox = egui::Checkbox::without_text(&mut all)
                    .indeterminate(state == SelectAllState::Some);
                if ui.add(checkbox).clicked() {
                    msgs.push(ProductsMsg::ToggleAllVisible);
                }
            });
            header.col(|ui| {
                ui.strong("Product");
            });
            for name in columns {
                header.col(|ui| {
                    ui.strong(*name);
                });
            }
            header.col(|_| {});
        })
        .body(|mut body| {
            for idx in rows {
                let Some(record) = model.products.get(idx) else {
                    continue;
                };
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        let mut checked = model.selection.contains(idx);
                        if ui.checkbox(&mut checked, "").clicked() {
                            msgs.push(ProductsMsg::ToggleRow(idx));
                        }
                    });
                    row.col(|ui| {
                        ui.label(record.display_name());
                    });
                    for name in columns {
                        row.col(|ui| {
                            ui.label(record.get(name));
                        });
                    }
                    row.col(|ui| {
                        ui.add_enabled_ui(!model.locked(), |ui| {
                            if ui
                                .small_button(egui_phosphor::regular::PENCIL_SIMPLE)
                                .on_hover_text("Edit")
                                .clicked()
                            {
                                msgs.push(ProductsMsg::OpenEdit(idx));
                            }
                            if ui
                                .small_button(egui_phosphor::regular::TRASH)
                                .on_hover_text("Delete")
                                .clicked()
                            {
                                msgs.push(ProductsMsg::RequestDelete(idx));
                            }
                        });
                    });
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::field::FieldDefinition;
    use crate::models::options::RawOptions;
    use crate::models::record::RecordId;

    fn registry() -> FieldRegistry {
        let mut registry = FieldRegistry::default();
        let mut color = FieldDefinition::new("color");
        color.group = "Looks".into();
        color.options = RawOptions::Text("red|blue".into());
        let mut title = FieldDefinition::new("title");
        title.required = true;
        registry.replace(vec![color, title, FieldDefinition::new("size")]);
        registry
    }

    fn loaded(products: Vec<Record>) -> ProductsModel {
        let mut model = ProductsModel::default();
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::Loaded(Ok(products)), &registry(), &mut cmds);
        model
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::from_pairs([("sku", "A1"), ("title", "Shirt"), ("color", "red")]),
            Record::from_pairs([("sku", "B2"), ("title", "Socks"), ("color", "blue")]),
            Record::from_pairs([("title", "Hat"), ("legacy", "x")]),
        ]
    }

    #[test]
    fn keyed_edit_merges_only_changed_fields() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(1), &reg, &mut cmds);
        update(
            &mut model,
            ProductsMsg::Edit(EditMsg::Value {
                key: "color".into(),
                value: "red ".into(),
            }),
            &reg,
            &mut cmds,
        );
        update(&mut model, ProductsMsg::Edit(EditMsg::Save), &reg, &mut cmds);
        let Some(ProductsCommand::Update(update_body)) = cmds.pop() else {
            panic!("expected update command");
        };
        assert_eq!(
            update_body,
            ProductUpdate::Keyed {
                id: RecordId {
                    field: "sku".into(),
                    value: "B2".into()
                },
                updates: BTreeMap::from([("color".to_string(), "red".to_string())]),
            }
        );

        let event = update(
            &mut model,
            ProductsMsg::Updated {
                update: update_body,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        )
        .unwrap();
        assert_eq!(event.message, "Product updated!");
        assert!(cmds.is_empty(), "single edits merge without refetch");
        assert_eq!(model.products()[1].get("color"), "red");
        assert_eq!(model.products()[1].get("title"), "Socks");
        assert_eq!(model.products()[0].get("color"), "red");
        assert!(model.edit.is_none());
    }

    #[test]
    fn empty_diff_sends_nothing() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(0), &reg, &mut cmds);
        let event = update(&mut model, ProductsMsg::Edit(EditMsg::Save), &reg, &mut cmds).unwrap();
        assert_eq!(event.message, "No changes to save.");
        assert!(cmds.is_empty());
        assert!(model.edit.is_some());
    }

    #[test]
    fn required_field_blocks_save() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(0), &reg, &mut cmds);
        update(
            &mut model,
            ProductsMsg::Edit(EditMsg::Value {
                key: "title".into(),
                value: "  ".into(),
            }),
            &reg,
            &mut cmds,
        );
        let event = update(&mut model, ProductsMsg::Edit(EditMsg::Save), &reg, &mut cmds).unwrap();
        assert_eq!(event, UiEvent::error("Field 'title' is required."));
        assert!(cmds.is_empty());
    }

    #[test]
    fn legacy_edit_uses_index() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(2), &reg, &mut cmds);
        update(
            &mut model,
            ProductsMsg::Edit(EditMsg::Value {
                key: "size".into(),
                value: "L".into(),
            }),
            &reg,
            &mut cmds,
        );
        update(&mut model, ProductsMsg::Edit(EditMsg::Save), &reg, &mut cmds);
        assert!(matches!(
            cmds.pop(),
            Some(ProductsCommand::Update(ProductUpdate::Legacy { index: 2, .. }))
        ));
    }

    #[test]
    fn failed_update_leaves_cache_untouched() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(0), &reg, &mut cmds);
        let body = ProductUpdate::Keyed {
            id: RecordId {
                field: "sku".into(),
                value: "A1".into(),
            },
            updates: BTreeMap::from([("color".to_string(), "green".to_string())]),
        };
        let event = update(
            &mut model,
            ProductsMsg::Updated {
                update: body,
                result: Err("Failed to reach server.".into()),
            },
            &reg,
            &mut cmds,
        )
        .unwrap();
        assert!(event.is_error);
        assert_eq!(model.products()[0].get("color"), "red");
        assert!(model.edit.as_ref().is_some_and(|s| !s.saving));
    }

    #[test]
    fn single_delete_confirms_then_removes_by_identifier() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        model.selection.toggle(1);
        model.selection.toggle(2);

        update(&mut model, ProductsMsg::RequestDelete(0), &reg, &mut cmds);
        assert!(cmds.is_empty());
        update(&mut model, ProductsMsg::ConfirmPending, &reg, &mut cmds);
        let Some(ProductsCommand::Delete(target)) = cmds.pop() else {
            panic!("expected delete command");
        };

        update(
            &mut model,
            ProductsMsg::Deleted {
                target,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        );
        assert_eq!(model.products().len(), 2);
        assert!(model.products().iter().all(|p| p.get("sku") != "A1"));
        assert_eq!(model.selection.indices(), vec![0, 1]);
    }

    #[test]
    fn bulk_edit_refetches_instead_of_merging() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();

        let event = update(&mut model, ProductsMsg::ApplyBulkEdit, &reg, &mut cmds).unwrap();
        assert_eq!(event.message, "No products selected.");

        update(&mut model, ProductsMsg::ToggleRow(0), &reg, &mut cmds);
        update(&mut model, ProductsMsg::ToggleRow(2), &reg, &mut cmds);
        update(&mut model, ProductsMsg::BulkFieldChanged("size".into()), &reg, &mut cmds);
        update(&mut model, ProductsMsg::BulkValueChanged("XL".into()), &reg, &mut cmds);
        update(&mut model, ProductsMsg::ApplyBulkEdit, &reg, &mut cmds);
        assert_eq!(
            cmds.pop(),
            Some(ProductsCommand::BulkEdit(BulkEdit {
                indices: vec![0, 2],
                field: "size".into(),
                value: "XL".into(),
            }))
        );

        update(&mut model, ProductsMsg::BulkEdited(Ok(())), &reg, &mut cmds);
        assert_eq!(cmds, vec![ProductsCommand::Load]);
        assert_eq!(model.products()[0].get("size"), "", "no optimistic merge");

        let mut server = sample();
        server[0].set("size", "XL");
        server[2].set("size", "XL");
        update(&mut model, ProductsMsg::Loaded(Ok(server)), &reg, &mut cmds);
        assert_eq!(model.products()[0].get("size"), "XL");
        assert_eq!(model.products()[1].get("size"), "");
    }

    #[test]
    fn bulk_delete_clears_selection_and_refetches() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::ToggleAllVisible, &reg, &mut cmds);
        assert_eq!(model.select_all_state(), SelectAllState::All);

        update(&mut model, ProductsMsg::RequestBulkDelete, &reg, &mut cmds);
        update(&mut model, ProductsMsg::ConfirmPending, &reg, &mut cmds);
        assert_eq!(cmds.pop(), Some(ProductsCommand::BulkDelete(vec![0, 1, 2])));

        update(&mut model, ProductsMsg::BulkDeleted(Ok(())), &reg, &mut cmds);
        assert!(model.selection.is_empty());
        assert_eq!(cmds, vec![ProductsCommand::Load]);
    }

    #[test]
    fn filter_and_group_reset_paging() {
        let reg = registry();
        let many: Vec<Record> = (0..60)
            .map(|i| Record::from_pairs([("sku", format!("S{i}")), ("title", format!("Item {i}"))]))
            .collect();
        let mut model = loaded(many);
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::PageStep(1), &reg, &mut cmds);
        update(&mut model, ProductsMsg::PageStep(1), &reg, &mut cmds);
        assert_eq!(model.page.page(), 2);
        assert_eq!(model.page_indices().len(), 10);

        update(&mut model, ProductsMsg::FilterChanged("item 1".into()), &reg, &mut cmds);
        assert_eq!(model.page.page(), 0);
        assert_eq!(model.filtered_indices().len(), 11);

        update(&mut model, ProductsMsg::ToggleRow(1), &reg, &mut cmds);
        assert_eq!(model.select_all_state(), SelectAllState::Some);

        update(&mut model, ProductsMsg::PageStep(1), &reg, &mut cmds);
        update(&mut model, ProductsMsg::GroupChanged(Some("Looks".into())), &reg, &mut cmds);
        assert_eq!(model.page.page(), 0);
        assert_eq!(group_columns(&reg, model.group.as_deref()), vec!["color"]);
        assert_eq!(group_columns(&reg, None), vec!["color", "title", "size"]);
    }

    fn edit_size(model: &mut ProductsModel, reg: &FieldRegistry, cmds: &mut Vec<ProductsCommand>) {
        update(
            model,
            ProductsMsg::Edit(EditMsg::Value {
                key: "size".into(),
                value: "L".into(),
            }),
            reg,
            cmds,
        );
        update(model, ProductsMsg::Edit(EditMsg::Save), reg, cmds);
    }

    #[test]
    fn editor_follows_legacy_row_when_an_earlier_row_is_deleted() {
        let reg = registry();
        let mut model = loaded(vec![
            Record::from_pairs([("sku", "A1"), ("title", "Shirt")]),
            Record::from_pairs([("title", "Hat")]),
            Record::from_pairs([("title", "Cap")]),
        ]);
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(1), &reg, &mut cmds);

        update(&mut model, ProductsMsg::RequestDelete(0), &reg, &mut cmds);
        assert!(model.confirm.is_none(), "row actions wait for the editor");

        // A delete already in flight lands while the editor is open.
        let event = update(
            &mut model,
            ProductsMsg::Deleted {
                target: ProductRef::Id(RecordId {
                    field: "sku".into(),
                    value: "A1".into(),
                }),
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        );
        assert_eq!(event, Some(UiEvent::info("Product deleted!")));
        assert_eq!(model.edit.as_ref().map(|s| s.index), Some(0));

        edit_size(&mut model, &reg, &mut cmds);
        let Some(ProductsCommand::Update(body)) = cmds.pop() else {
            panic!("expected update command");
        };
        assert!(matches!(body, ProductUpdate::Legacy { index: 0, .. }));

        update(
            &mut model,
            ProductsMsg::Updated {
                update: body,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        );
        assert_eq!(model.products()[0].get("size"), "L");
        assert_eq!(model.products()[1].get("size"), "");
    }

    #[test]
    fn reload_moves_or_closes_the_editor() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(1), &reg, &mut cmds);

        let mut reordered = sample();
        reordered.swap(0, 1);
        let event = update(&mut model, ProductsMsg::Loaded(Ok(reordered)), &reg, &mut cmds);
        assert!(event.is_none());
        assert_eq!(model.edit.as_ref().map(|s| s.index), Some(0));

        let without_socks = vec![sample().remove(0)];
        let event = update(&mut model, ProductsMsg::Loaded(Ok(without_socks)), &reg, &mut cmds);
        assert!(event.is_some_and(|e| e.is_error));
        assert!(model.edit.is_none());
    }

    #[test]
    fn reload_during_legacy_save_merges_into_moved_row() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::OpenEdit(2), &reg, &mut cmds);
        edit_size(&mut model, &reg, &mut cmds);
        let Some(ProductsCommand::Update(body)) = cmds.pop() else {
            panic!("expected update command");
        };

        let mut shorter = sample();
        shorter.remove(0);
        update(&mut model, ProductsMsg::Loaded(Ok(shorter)), &reg, &mut cmds);
        update(
            &mut model,
            ProductsMsg::Updated {
                update: body,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        );
        assert_eq!(model.products()[1].get("size"), "L");
        assert_eq!(model.products()[0].get("size"), "");
    }

    #[test]
    fn busy_model_ignores_new_mutations() {
        let reg = registry();
        let mut model = loaded(sample());
        let mut cmds = Vec::new();
        update(&mut model, ProductsMsg::RequestDelete(0), &reg, &mut cmds);
        model.busy = true;
        update(&mut model, ProductsMsg::ConfirmPending, &reg, &mut cmds);
        update(&mut model, ProductsMsg::OpenEdit(0), &reg, &mut cmds);
        assert!(cmds.is_empty());
        assert!(model.confirm.is_none());
        assert!(model.edit.is_none());
    }
}
