// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Server-side product search with completeness and per-group fill rates.

use std::collections::BTreeMap;

use eframe::egui;
use egui_extras::{Column, TableBuilder};

use crate::api::types::SearchQuery;
use crate::config::UiConfig;
use crate::models::field::FieldRegistry;
use crate::models::grouping::FillStats;
use crate::models::record::{Record, RecordId, locate};
use crate::ui::components::confirm::{Confirmation, confirm_dialog};
use crate::ui::components::product_editor::{self, EditMsg, EditSession};
use crate::ui::components::{UiEvent, hint};

const NO_IDENTIFIER: &str = "Product has no identifier; change it from the Products page.";

#[derive(Clone, Debug, PartialEq)]
pub struct SearchModel {
    pub query: SearchQuery,
    results: Vec<Record>,
    /// True once a search has returned, so "no results" can be told apart from "not searched".
    pub searched: bool,
    pub busy: bool,
    pub confirm_delete: Option<RecordId>,
    pub edit: Option<EditSession>,
    form_page_size: usize,
}

impl Default for SearchModel {
    fn default() -> Self {
        Self::new(&UiConfig::default())
    }
}

impl SearchModel {
    pub fn new(config: &UiConfig) -> Self {
        Self {
            query: SearchQuery::default(),
            results: Vec::new(),
            searched: false,
            busy: false,
            confirm_delete: None,
            edit: None,
            form_page_size: config.form_page_size,
        }
    }

    pub fn results(&self) -> &[Record] {
        &self.results
    }

    /// New searches and row actions wait for the open editor or a running request.
    pub fn locked(&self) -> bool {
        self.busy || self.edit.is_some()
    }

    /// Fill rate per field group over the current results.
    pub fn group_stats(&self, registry: &FieldRegistry) -> Vec<(String, FillStats)> {
        registry.grouped().fill_stats(&self.results)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchMsg {
    QueryChanged(String),
    FieldKeyChanged(String),
    FieldValueChanged(String),
    Submit,
    Finished(Result<Vec<Record>, String>),
    RequestDelete(usize),
    ConfirmDelete,
    CancelDelete,
    Deleted {
        id: RecordId,
        result: Result<(), String>,
    },
    OpenEdit(usize),
    Edit(EditMsg),
    Updated {
        id: RecordId,
        updates: BTreeMap<String, String>,
        result: Result<(), String>,
    },
}

/// Search results are addressed by identifier only; their positions mean nothing to the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchCommand {
    Search(SearchQuery),
    Delete(RecordId),
    Update {
        id: RecordId,
        updates: BTreeMap<String, String>,
    },
    RefreshProducts,
}

pub fn update(
    model: &mut SearchModel,
    msg: SearchMsg,
    registry: &FieldRegistry,
    cmds: &mut Vec<SearchCommand>,
) -> Option<UiEvent> {
    match msg {
        SearchMsg::QueryChanged(text) => {
            model.query.query = text;
            None
        }
        SearchMsg::FieldKeyChanged(key) => {
            model.query.field_key = key;
            None
        }
        SearchMsg::FieldValueChanged(value) => {
            model.query.field_value = value;
            None
        }
        SearchMsg::Submit => {
            if model.locked() {
                return None;
            }
            model.busy = true;
            cmds.push(SearchCommand::Search(SearchQuery {
                query: model.query.query.trim().to_string(),
                field_key: model.query.field_key.trim().to_string(),
                field_value: model.query.field_value.trim().to_string(),
            }));
            None
        }
        SearchMsg::Finished(Ok(results)) => {
            model.busy = false;
            model.searched = true;
            model.results = results;
            if model.results.is_empty() {
                Some(UiEvent::info("No results found."))
            } else {
                None
            }
        }
        SearchMsg::Finished(Err(err)) => {
            model.busy = false;
            Some(UiEvent::error(err))
        }
        SearchMsg::RequestDelete(pos) => {
            if model.locked() {
                return None;
            }
            let record = model.results.get(pos)?;
            match record.identifier() {
                Some(id) => {
                    model.confirm_delete = Some(id);
                    None
                }
                None => Some(UiEvent::error(NO_IDENTIFIER)),
            }
        }
        SearchMsg::CancelDelete => {
            model.confirm_delete = None;
            None
        }
        SearchMsg::ConfirmDelete => {
            let id = model.confirm_delete.take()?;
            if model.locked() {
                return None;
            }
            model.busy = true;
            cmds.push(SearchCommand::Delete(id));
            None
        }
        SearchMsg::Deleted { id, result } => {
            model.busy = false;
            match result {
                Ok(()) => {
                    if let Some(pos) = locate(&model.results, &id) {
                        model.results.remove(pos);
                    }
                    cmds.push(SearchCommand::RefreshProducts);
                    Some(UiEvent::info("Product deleted!"))
                }
                Err(err) => Some(UiEvent::error(err)),
            }
        }
        SearchMsg::OpenEdit(pos) => {
            if model.locked() {
                return None;
            }
            let record = model.results.get(pos)?;
            if record.identifier().is_none() {
                return Some(UiEvent::error(NO_IDENTIFIER));
            }
            model.edit = Some(EditSession::open(pos, record, registry, model.form_page_size));
            None
        }
        SearchMsg::Edit(EditMsg::Cancel) => {
            model.edit = None;
            None
        }
        SearchMsg::Edit(EditMsg::Save) => {
            let session = model.edit.as_mut()?;
            let id = session.target.clone()?;
            if session.saving {
                return None;
            }
            match session.pending_changes(registry) {
                Ok(updates) => {
                    session.saving = true;
                    cmds.push(SearchCommand::Update { id, updates });
                    None
                }
                Err(event) => Some(event),
            }
        }
        SearchMsg::Edit(msg) => {
            if let Some(session) = model.edit.as_mut() {
                product_editor::update(session, msg);
            }
            None
        }
        SearchMsg::Updated {
            id,
            updates,
            result,
        } => match result {
            Ok(()) => {
                if let Some(pos) = locate(&model.results, &id) {
                    model.results[pos].apply_updates(&updates);
                }
                model.edit = None;
                cmds.push(SearchCommand::RefreshProducts);
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

pub fn view(ui: &mut egui::Ui, model: &SearchModel, registry: &FieldRegistry) -> Vec<SearchMsg> {
    let mut msgs = Vec::new();

    ui.heading("Search");
    ui.add_space(6.0);

    egui::Grid::new("search_form")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            ui.label("Text");
            let mut query = model.query.query.clone();
            if ui
                .add(egui::TextEdit::singleline(&mut query).desired_width(260.0))
                .changed()
            {
                msgs.push(SearchMsg::QueryChanged(query));
            }
            ui.end_row();

            ui.label("Field");
            let shown = if model.query.field_key.is_empty() {
                "Any field"
            } else {
                model.query.field_key.as_str()
            };
            egui::ComboBox::from_id_salt("search_field")
                .selected_text(shown)
                .show_ui(ui, |ui| {
                    if ui
                        .selectable_label(model.query.field_key.is_empty(), "Any field")
                        .clicked()
                    {
                        msgs.push(SearchMsg::FieldKeyChanged(String::new()));
                    }
                    for field in registry.fields() {
                        if ui
                            .selectable_label(model.query.field_key == field.field_name, &field.field_name)
                            .clicked()
                        {
                            msgs.push(SearchMsg::FieldKeyChanged(field.field_name.clone()));
                        }
                    }
                });
            ui.end_row();

            ui.label("Value");
            let mut value = model.query.field_value.clone();
            if ui
                .add_enabled(
                    !model.query.field_key.is_empty(),
                    egui::TextEdit::singleline(&mut value).desired_width(260.0),
                )
                .changed()
            {
                msgs.push(SearchMsg::FieldValueChanged(value));
            }
            ui.end_row();
        });

    ui.add_space(6.0);
    ui.horizontal(|ui| {
        if ui
            .add_enabled(
                !model.busy,
                egui::Button::new(format!("{} Search", egui_phosphor::regular::MAGNIFYING_GLASS)),
            )
            .clicked()
        {
            msgs.push(SearchMsg::Submit);
        }
        if model.busy {
            ui.add(egui::Spinner::new().size(14.0));
        }
    });
    ui.add_space(8.0);

    if !model.searched {
        hint(ui, "Enter a search and press Search.");
    } else if model.results.is_empty() {
        hint(ui, "No results found.");
    } else {
        render_stats(ui, model, registry);
        ui.add_space(6.0);
        render_results(ui, model, registry, &mut msgs);
    }

    if let Some(session) = &model.edit {
        let edits = product_editor::view(ui.ctx(), session, registry);
        msgs.extend(edits.into_iter().map(SearchMsg::Edit));
    }
    if let Some(id) = &model.confirm_delete {
        let message = format!("Delete product {} '{}'?", id.field, id.value);
        match confirm_dialog(ui.ctx(), "Confirm delete", &message, "Delete") {
            Some(Confirmation::Confirmed) => msgs.push(SearchMsg::ConfirmDelete),
            Some(Confirmation::Cancelled) => msgs.push(SearchMsg::CancelDelete),
            None => {}
        }
    }

    msgs
}

fn render_stats(ui: &mut egui::Ui, model: &SearchModel, registry: &FieldRegistry) {
    egui::CollapsingHeader::new(format!("Group fill rates ({} results)", model.results.len()))
        .default_open(false)
        .show(ui, |ui| {
            for (group, stats) in model.group_stats(registry) {
                ui.horizontal(|ui| {
                    ui.label(&group);
                    ui.add(
                        egui::ProgressBar::new(stats.percent() as f32 / 100.0)
                            .desired_width(180.0)
                            .text(format!("{}% ({}/{})", stats.percent(), stats.filled, stats.total)),
                    );
                });
            }
        });
}

fn render_results(
    ui: &mut egui::Ui,
    model: &SearchModel,
    registry: &FieldRegistry,
    msgs: &mut Vec<SearchMsg>,
) {
    TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(220.0).at_least(80.0).clip(true))
        .column(Column::initial(160.0).clip(true))
        .column(Column::exact(110.0))
        .column(Column::exact(64.0))
        .header(22.0, |mut header| {
            header.col(|ui| {
                ui.strong("Product");
            });
            header.col(|ui| {
                ui.strong("Identifier");
            });
            header.col(|ui| {
                ui.strong("Completeness");
            });
            header.col(|_| {});
        })
        .body(|mut body| {
            for (pos, record) in model.results.iter().enumerate() {
                body.row(22.0, |mut row| {
                    row.col(|ui| {
                        ui.label(record.display_name());
                    });
                    row.col(|ui| match record.identifier() {
                        Some(id) => {
                            ui.label(format!("{}: {}", id.field, id.value));
                        }
                        None => {
                            ui.weak("none");
                        }
                    });
                    row.col(|ui| {
                        let pct = record.completeness(registry.fields());
                        ui.add(
                            egui::ProgressBar::new(pct as f32 / 100.0)
                                .desired_width(100.0)
                                .text(format!("{pct}%")),
                        );
                    });
                    row.col(|ui| {
                        ui.add_enabled_ui(!model.locked(), |ui| {
                            if ui
                                .small_button(egui_phosphor::regular::PENCIL_SIMPLE)
                                .on_hover_text("Edit")
                                .clicked()
                            {
                                msgs.push(SearchMsg::OpenEdit(pos));
                            }
                            if ui
                                .small_button(egui_phosphor::regular::TRASH)
                                .on_hover_text("Delete")
                                .clicked()
                            {
                                msgs.push(SearchMsg::RequestDelete(pos));
                            }
                        });
                    });
                });
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::field::FieldDefinition;

    fn registry() -> FieldRegistry {
        let mut registry = FieldRegistry::default();
        let mut color = FieldDefinition::new("color");
        color.group = "Looks".into();
        registry.replace(vec![color, FieldDefinition::new("title")]);
        registry
    }

    fn results() -> Vec<Record> {
        vec![
            Record::from_pairs([("sku", "A1"), ("title", "Shirt"), ("color", "red")]),
            Record::from_pairs([("title", "Loose")]),
        ]
    }

    #[test]
    fn submit_trims_and_reports_empty_results() {
        let reg = registry();
        let mut model = SearchModel::default();
        let mut cmds = Vec::new();
        update(&mut model, SearchMsg::QueryChanged(" shirt ".into()), &reg, &mut cmds);
        update(&mut model, SearchMsg::FieldKeyChanged("color".into()), &reg, &mut cmds);
        update(&mut model, SearchMsg::FieldValueChanged("red".into()), &reg, &mut cmds);
        update(&mut model, SearchMsg::Submit, &reg, &mut cmds);
        assert_eq!(
            cmds,
            vec![SearchCommand::Search(SearchQuery {
                query: "shirt".into(),
                field_key: "color".into(),
                field_value: "red".into(),
            })]
        );

        let event = update(&mut model, SearchMsg::Finished(Ok(Vec::new())), &reg, &mut cmds).unwrap();
        assert_eq!(event.message, "No results found.");
        assert!(model.searched);
        assert!(!model.busy);
    }

    #[test]
    fn delete_needs_identifier_and_refreshes_products() {
        let reg = registry();
        let mut model = SearchModel::default();
        let mut cmds = Vec::new();
        update(&mut model, SearchMsg::Finished(Ok(results())), &reg, &mut cmds);

        let event = update(&mut model, SearchMsg::RequestDelete(1), &reg, &mut cmds).unwrap();
        assert!(event.is_error);
        assert!(model.confirm_delete.is_none());

        update(&mut model, SearchMsg::RequestDelete(0), &reg, &mut cmds);
        update(&mut model, SearchMsg::ConfirmDelete, &reg, &mut cmds);
        let id = RecordId {
            field: "sku".into(),
            value: "A1".into(),
        };
        assert_eq!(cmds.pop(), Some(SearchCommand::Delete(id.clone())));

        update(
            &mut model,
            SearchMsg::Deleted {
                id,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        );
        assert_eq!(model.results().len(), 1);
        assert_eq!(cmds, vec![SearchCommand::RefreshProducts]);
    }

    #[test]
    fn group_stats_cover_results() {
        let reg = registry();
        let mut model = SearchModel::default();
        let mut cmds = Vec::new();
        update(&mut model, SearchMsg::Finished(Ok(results())), &reg, &mut cmds);
        let stats = model.group_stats(&reg);
        assert_eq!(stats[0].0, "Looks");
        assert_eq!(stats[0].1, FillStats { filled: 1, total: 2 });
        assert_eq!(stats[1].1.percent(), 100);
        assert_eq!(model.results()[0].completeness(reg.fields()), 100);
        assert_eq!(model.results()[1].completeness(reg.fields()), 50);
    }

    #[test]
    fn edit_from_results_updates_by_identifier() {
        let reg = registry();
        let mut model = SearchModel::default();
        let mut cmds = Vec::new();
        update(&mut model, SearchMsg::Finished(Ok(results())), &reg, &mut cmds);

        let event = update(&mut model, SearchMsg::OpenEdit(1), &reg, &mut cmds).unwrap();
        assert!(event.is_error);
        assert!(model.edit.is_none());

        update(&mut model, SearchMsg::OpenEdit(0), &reg, &mut cmds);
        update(
            &mut model,
            SearchMsg::Edit(EditMsg::Value {
                key: "color".into(),
                value: "blue".into(),
            }),
            &reg,
            &mut cmds,
        );
        update(&mut model, SearchMsg::Submit, &reg, &mut cmds);
        update(&mut model, SearchMsg::RequestDelete(0), &reg, &mut cmds);
        assert!(cmds.is_empty(), "search and delete wait for the editor");
        assert!(model.confirm_delete.is_none());

        update(&mut model, SearchMsg::Edit(EditMsg::Save), &reg, &mut cmds);
        let id = RecordId {
            field: "sku".into(),
            value: "A1".into(),
        };
        let updates = BTreeMap::from([("color".to_string(), "blue".to_string())]);
        assert_eq!(
            cmds.pop(),
            Some(SearchCommand::Update {
                id: id.clone(),
                updates: updates.clone(),
            })
        );
        assert!(model.edit.as_ref().is_some_and(|s| s.saving));

        let event = update(
            &mut model,
            SearchMsg::Updated {
                id,
                updates,
                result: Ok(()),
            },
            &reg,
            &mut cmds,
        )
        .unwrap();
        assert_eq!(event.message, "Product updated!");
        assert_eq!(model.results()[0].get("color"), "blue");
        assert!(model.edit.is_none());
        assert_eq!(cmds, vec![SearchCommand::RefreshProducts]);
    }

    #[test]
    fn failed_result_update_keeps_editor_open() {
        let reg = registry();
        let mut model = SearchModel::default();
        let mut cmds = Vec::new();
        update(&mut model, SearchMsg::Finished(Ok(results())), &reg, &mut cmds);
        update(&mut model, SearchMsg::OpenEdit(0), &reg, &mut cmds);
        let event = update(
            &mut model,
            SearchMsg::Updated {
                id: RecordId {
                    field: "sku".into(),
                    value: "A1".into(),
                },
                updates: BTreeMap::from([("color".to_string(), "blue".to_string())]),
                result: Err("Update failed.".into()),
            },
            &reg,
            &mut cmds,
        )
        .unwrap();
        assert!(event.is_error);
        assert_eq!(model.results()[0].get("color"), "red");
        assert!(model.edit.as_ref().is_some_and(|s| !s.saving));
        assert!(cmds.is_empty());
    }
}
