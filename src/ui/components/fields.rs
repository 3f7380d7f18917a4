// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Custom field registry: loading, the manage-fields editor and the add-field form.

use eframe::egui;

use crate::config::UiConfig;
use crate::models::field::{FieldDefinition, FieldRegistry};
use crate::models::options::{OptionsPolicy, RawOptions};
use crate::ui::components::confirm::{Confirmation, confirm_dialog};
use crate::ui::components::{UiEvent, hint, toggle_switch};

/// Editable copy of a field definition.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDraft {
    pub field_name: String,
    pub description: String,
    pub required: bool,
    pub options: String,
    pub group: String,
}

impl FieldDraft {
    pub fn from_field(field: &FieldDefinition) -> Self {
        Self {
            field_name: field.field_name.clone(),
            description: field.description.clone(),
            required: field.required,
            options: field.options.to_wire(),
            group: field.group.clone(),
        }
    }

    pub fn to_field(&self) -> FieldDefinition {
        let options = self.options.trim();
        FieldDefinition {
            field_name: self.field_name.trim().to_string(),
            required: self.required,
            description: self.description.trim().to_string(),
            options: if options.is_empty() {
                RawOptions::Absent
            } else {
                RawOptions::Text(options.to_string())
            },
            group: self.group.trim().to_string(),
        }
    }

    fn apply(&mut self, edit: DraftEdit) {
        match edit {
            DraftEdit::Name(v) => self.field_name = v,
            DraftEdit::Description(v) => self.description = v,
            DraftEdit::Required(v) => self.required = v,
            DraftEdit::Options(v) => self.options = v,
            DraftEdit::Group(v) => self.group = v,
        }
    }
}

/// One edit to a [`FieldDraft`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftEdit {
    Name(String),
    Description(String),
    Required(bool),
    Options(String),
    Group(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldsModel {
    registry: FieldRegistry,
    pub loading: bool,
    pub filter: String,
    selected: Option<usize>,
    draft: FieldDraft,
    new_field: FieldDraft,
    confirm_delete: bool,
    pub busy: bool,
}

impl Default for FieldsModel {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl FieldsModel {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            registry: FieldRegistry::new(
                OptionsPolicy {
                    dedupe: config.dedupe_options,
                },
                &config.default_group,
            ),
            loading: false,
            filter: String::new(),
            selected: None,
            draft: FieldDraft::default(),
            new_field: FieldDraft::default(),
            confirm_delete: false,
            busy: false,
        }
    }

    pub fn registry(&self) -> &FieldRegistry {
        &self.registry
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn draft(&self) -> &FieldDraft {
        &self.draft
    }

    pub fn new_field(&self) -> &FieldDraft {
        &self.new_field
    }

    /// Indices of fields whose name contains the filter (case-insensitive).
    pub fn filtered_indices(&self) -> Vec<usize> {
        let needle = self.filter.trim().to_lowercase();
        self.registry
            .fields()
            .iter()
            .enumerate()
            .filter(|(_, f)| needle.is_empty() || f.field_name.to_lowercase().contains(&needle))
            .map(|(idx, _)| idx)
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldsMsg {
    Refresh,
    Loaded(Result<Vec<FieldDefinition>, String>),
    FilterChanged(String),
    Select(usize),
    EditSelected(DraftEdit),
    SaveSelected,
    Updated {
        index: usize,
        field: FieldDefinition,
        result: Result<(), String>,
    },
    RequestDelete,
    ConfirmDelete,
    CancelDelete,
    Deleted {
        index: usize,
        result: Result<(), String>,
    },
    EditNew(DraftEdit),
    SubmitNew,
    Added(Result<(), String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldsCommand {
    Load,
    Add(FieldDefinition),
    Update { index: usize, field: FieldDefinition },
    Delete { index: usize },
}

pub fn update(
    model: &mut FieldsModel,
    msg: FieldsMsg,
    cmds: &mut Vec<FieldsCommand>,
) -> Option<UiEvent> {
    match msg {
        FieldsMsg::Refresh => {
            model.loading = true;
            cmds.push(FieldsCommand::Load);
            None
        }
        FieldsMsg::Loaded(Ok(fields)) => {
            model.loading = false;
            model.registry.replace(fields);
            model.selected = model.selected.filter(|idx| *idx < model.registry.len());
            match model.selected.and_then(|idx| model.registry.get(idx)) {
                Some(field) => model.draft = FieldDraft::from_field(field),
                None => model.draft = FieldDraft::default(),
            }
            None
        }
        FieldsMsg::Loaded(Err(err)) => {
            model.loading = false;
            Some(UiEvent::error(err))
        }
        FieldsMsg::FilterChanged(text) => {
            model.filter = text;
            None
        }
        FieldsMsg::Select(index) => {
            if let Some(field) = model.registry.get(index) {
                model.selected = Some(index);
                model.draft = FieldDraft::from_field(field);
                model.confirm_delete = false;
            }
            None
        }
        FieldsMsg::EditSelected(edit) => {
            if model.selected.is_some() {
                model.draft.apply(edit);
            }
            None
        }
        FieldsMsg::SaveSelected => {
            let index = model.selected?;
            let current = model.registry.get(index)?;
            let field = model.draft.to_field();
            if field.field_name.is_empty() {
                return Some(UiEvent::error("Field name is required."));
            }
            if field == FieldDraft::from_field(current).to_field() {
                return Some(UiEvent::info("No changes to save."));
            }
            model.busy = true;
            cmds.push(FieldsCommand::Update { index, field });
            None
        }
        FieldsMsg::Updated {
            index,
            field,
            result,
        } => {
            model.busy = false;
            match result {
                Ok(()) => {
                    if model.registry.set(index, field) {
                        if let Some(updated) = model.registry.get(index)
                            && model.selected == Some(index)
                        {
                            model.draft = FieldDraft::from_field(updated);
                        }
                    } else {
                        log::warn!("updated field index {index} no longer exists locally");
                    }
                    Some(UiEvent::info("Field updated!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        FieldsMsg::RequestDelete => {
            model.confirm_delete = model.selected.is_some();
            None
        }
        FieldsMsg::CancelDelete => {
            model.confirm_delete = false;
            None
        }
        FieldsMsg::ConfirmDelete => {
            if !model.confirm_delete {
                return None;
            }
            model.confirm_delete = false;
            let index = model.selected?;
            model.busy = true;
            cmds.push(FieldsCommand::Delete { index });
            None
        }
        FieldsMsg::Deleted { index, result } => {
            model.busy = false;
            match result {
                Ok(()) => {
                    model.registry.remove(index);
                    model.selected = match model.selected {
                        Some(sel) if sel == index => None,
                        Some(sel) if sel > index => Some(sel - 1),
                        other => other,
                    };
                    if model.selected.is_none() {
                        model.draft = FieldDraft::default();
                    }
                    Some(UiEvent::info("Field deleted!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        FieldsMsg::EditNew(edit) => {
            model.new_field.apply(edit);
            None
        }
        FieldsMsg::SubmitNew => {
            let field = model.new_field.to_field();
            if field.field_name.is_empty() {
                return Some(UiEvent::error("Field name is required."));
            }
            model.busy = true;
            cmds.push(FieldsCommand::Add(field));
            None
        }
        FieldsMsg::Added(result) => {
            model.busy = false;
            match result {
                Ok(()) => {
                    model.new_field = FieldDraft::default();
                    model.loading = true;
                    cmds.push(FieldsCommand::Load);
                    Some(UiEvent::info("Field added successfully!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
    }
}

/// Manage-fields page: filterable list on the left, editor on the right.
pub fn manage_view(ui: &mut egui::Ui, model: &FieldsModel) -> Vec<FieldsMsg> {
    let mut msgs = Vec::new();

    ui.horizontal(|ui| {
        ui.heading("Manage Fields");
        if ui
            .add_enabled(
                !model.loading,
                egui::Button::new(egui_phosphor::regular::ARROWS_CLOCKWISE),
            )
            .on_hover_text("Reload fields")
            .clicked()
        {
            msgs.push(FieldsMsg::Refresh);
        }
        if model.loading {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });
    ui.add_space(6.0);

    ui.columns(2, |cols| {
        render_list(&mut cols[0], model, &mut msgs);
        render_editor(&mut cols[1], model, &mut msgs);
    });

    if model.confirm_delete {
        let name = model
            .selected
            .and_then(|idx| model.registry.get(idx))
            .map(|f| f.field_name.as_str())
            .unwrap_or("this field");
        match confirm_dialog(
            ui.ctx(),
            "Delete field",
            &format!("Are you sure you want to delete '{name}'?"),
            "Delete",
        ) {
            Some(Confirmation::Confirmed) => msgs.push(FieldsMsg::ConfirmDelete),
            Some(Confirmation::Cancelled) => msgs.push(FieldsMsg::CancelDelete),
            None => {}
        }
    }

    msgs
}

fn render_list(ui: &mut egui::Ui, model: &FieldsModel, msgs: &mut Vec<FieldsMsg>) {
    let mut filter = model.filter.clone();
    if ui
        .add(
            egui::TextEdit::singleline(&mut filter)
                .hint_text(format!("{} Filter fields", egui_phosphor::regular::MAGNIFYING_GLASS)),
        )
        .changed()
    {
        msgs.push(FieldsMsg::FilterChanged(filter));
    }
    ui.add_space(4.0);

    let indices = model.filtered_indices();
    if indices.is_empty() {
        hint(ui, "No fields match.");
        return;
    }
    egui::ScrollArea::vertical()
        .id_salt("field_list")
        .max_height(420.0)
        .show(ui, |ui| {
            for idx in indices {
                let Some(field) = model.registry.get(idx) else {
                    continue;
                };
                let label = if field.group.is_empty() {
                    field.field_name.clone()
                } else {
                    format!("{}  ({})", field.field_name, field.group)
                };
                if ui
                    .selectable_label(model.selected == Some(idx), label)
                    .clicked()
                {
                    msgs.push(FieldsMsg::Select(idx));
                }
            }
        });
}

fn render_editor(ui: &mut egui::Ui, model: &FieldsModel, msgs: &mut Vec<FieldsMsg>) {
    if model.selected.is_none() {
        hint(ui, "Select a field to edit it.");
        return;
    }
    let groups = model.registry.existing_groups();
    let edits = draft_form(ui, "edit_field", &model.draft, &groups);
    msgs.extend(edits.into_iter().map(FieldsMsg::EditSelected));

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                !model.busy,
                egui::Button::new(format!("{} Save", egui_phosphor::regular::FLOPPY_DISK)),
            )
            .clicked()
        {
            msgs.push(FieldsMsg::SaveSelected);
        }
        if ui
            .add_enabled(
                !model.busy,
                egui::Button::new(format!("{} Delete", egui_phosphor::regular::TRASH)),
            )
            .clicked()
        {
            msgs.push(FieldsMsg::RequestDelete);
        }
    });
}

/// Add-field page.
pub fn add_view(ui: &mut egui::Ui, model: &FieldsModel) -> Vec<FieldsMsg> {
    let mut msgs = Vec::new();
    ui.heading("Add Field");
    hint(
        ui,
        "Options may be separated by |, commas, semicolons or new lines. Leave empty for free text.",
    );
    ui.add_space(6.0);

    let groups = model.registry.existing_groups();
    let edits = draft_form(ui, "new_field", &model.new_field, &groups);
    msgs.extend(edits.into_iter().map(FieldsMsg::EditNew));

    ui.add_space(8.0);
    if ui
        .add_enabled(
            !model.busy,
            egui::Button::new(format!("{} Add field", egui_phosphor::regular::PLUS)),
        )
        .clicked()
    {
        msgs.push(FieldsMsg::SubmitNew);
    }
    msgs
}

fn draft_form(
    ui: &mut egui::Ui,
    id: &str,
    draft: &FieldDraft,
    groups: &[String],
) -> Vec<DraftEdit> {
    let mut edits = Vec::new();
    egui::Grid::new(id)
        .num_columns(2)
        .spacing(egui::vec2(8.0, 8.0))
        .show(ui, |ui| {
            ui.label("Field name *");
            let mut name = draft.field_name.clone();
            if ui.text_edit_singleline(&mut name).changed() {
                edits.push(DraftEdit::Name(name));
            }
            ui.end_row();

            ui.label("Description");
            let mut description = draft.description.clone();
            if ui.text_edit_singleline(&mut description).changed() {
                edits.push(DraftEdit::Description(description));
            }
            ui.end_row();

            ui.label("Required");
            let mut required = draft.required;
            if toggle_switch(ui, &mut required).clicked() {
                edits.push(DraftEdit::Required(required));
            }
            ui.end_row();

            ui.label("Options");
            let mut options = draft.options.clone();
            if ui
                .add(egui::TextEdit::multiline(&mut options).desired_rows(2))
                .changed()
            {
                edits.push(DraftEdit::Options(options));
            }
            ui.end_row();

            ui.label("Group");
            ui.horizontal(|ui| {
                let mut group = draft.group.clone();
                if ui.text_edit_singleline(&mut group).changed() {
                    edits.push(DraftEdit::Group(group));
                }
                if !groups.is_empty() {
                    egui::ComboBox::from_id_salt(format!("{id}_groups"))
                        .selected_text(egui_phosphor::regular::LIST)
                        .show_ui(ui, |ui| {
                            for g in groups {
                                if ui.selectable_label(draft.group == *g, g).clicked() {
                                    edits.push(DraftEdit::Group(g.clone()));
                                }
                            }
                        });
                }
            });
            ui.end_row();
        });
    edits
}
