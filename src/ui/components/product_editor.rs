// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Product edit window shared by the products table and the search results.

use std::collections::{BTreeMap, BTreeSet};

use eframe::egui;

use crate::api::types::ProductUpdate;
use crate::models::field::{FieldDefinition, FieldRegistry};
use crate::models::grouping::GroupedFields;
use crate::models::pagination::PageBook;
use crate::models::record::{Record, RecordId, editable_keys, locate};
use crate::ui::components::field_input::{field_input, first_violation};
use crate::ui::components::{UiEvent, pager_row, step_pager};

/// Editor state for one product, alive while the window is open.
#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    /// Position of the record in the owner's list.
    pub index: usize,
    pub target: Option<RecordId>,
    original: Record,
    pub values: BTreeMap<String, String>,
    layout: GroupedFields,
    pub expanded: BTreeSet<String>,
    pub pages: PageBook<String>,
    pub saving: bool,
}

impl EditSession {
    /// Open an editor over `record`: registry fields first, then keys only the record has.
    pub fn open(index: usize, record: &Record, registry: &FieldRegistry, page_size: usize) -> Self {
        let keys = editable_keys(registry.fields(), record);
        let defs: Vec<FieldDefinition> = keys
            .iter()
            .map(|k| {
                registry
                    .find(k)
                    .cloned()
                    .unwrap_or_else(|| FieldDefinition::new(k.clone()))
            })
            .collect();
        let layout = GroupedFields::from_fields_with(&defs, registry.default_group());
        let expanded = layout
            .names()
            .first()
            .map(|g| BTreeSet::from([g.to_string()]))
            .unwrap_or_default();
        Self {
            index,
            target: record.identifier(),
            original: record.clone(),
            values: keys
                .iter()
                .map(|k| (k.clone(), record.get(k).to_string()))
                .collect(),
            layout,
            expanded,
            pages: PageBook::new(page_size),
            saving: false,
        }
    }

    pub fn layout(&self) -> &GroupedFields {
        &self.layout
    }

    /// Changed keys only, trimmed.
    pub fn changes(&self) -> BTreeMap<String, String> {
        self.original.diff(&self.values)
    }

    /// Find this session's record in `records` after the list changed.
    ///
    /// Keyed records are found by identifier. Records without one only match an
    /// unchanged copy of the original, since their position is all the server knows.
    pub fn relocate(&self, records: &[Record]) -> Option<usize> {
        match &self.target {
            Some(id) => locate(records, id),
            None => records.iter().position(|r| r == &self.original),
        }
    }

    /// Validated, changed values, or the status to show instead of saving.
    pub fn pending_changes(&self, registry: &FieldRegistry) -> Result<BTreeMap<String, String>, UiEvent> {
        if let Some(violation) = first_violation(registry.fields(), &self.values) {
            return Err(UiEvent::error(violation));
        }
        let changes = self.changes();
        if changes.is_empty() {
            return Err(UiEvent::info("No changes to save."));
        }
        Ok(changes)
    }

    /// Request body addressing this record by identifier, or by position when it has none.
    pub fn update_body(&self, changes: BTreeMap<String, String>) -> ProductUpdate {
        match &self.target {
            Some(id) => ProductUpdate::Keyed {
                id: id.clone(),
                updates: changes,
            },
            None => ProductUpdate::Legacy {
                index: self.index,
                fields: changes,
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditMsg {
    Value { key: String, value: String },
    ToggleGroup(String),
    GroupPage { group: String, step: i8 },
    Save,
    Cancel,
}

/// Apply an in-window edit. `Save` and `Cancel` belong to the owning page.
pub fn update(session: &mut EditSession, msg: EditMsg) {
    match msg {
        EditMsg::Value { key, value } => {
            session.values.insert(key, value);
        }
        EditMsg::ToggleGroup(group) => {
            if !session.expanded.remove(&group) {
                session.expanded.insert(group);
            }
        }
        EditMsg::GroupPage { group, step } => {
            let len = session.layout.get(&group).map(<[_]>::len).unwrap_or(0);
            step_pager(session.pages.entry(group), step, len);
        }
        EditMsg::Save | EditMsg::Cancel => {}
    }
}

pub fn view(ctx: &egui::Context, session: &EditSession, registry: &FieldRegistry) -> Vec<EditMsg> {
    let mut msgs = Vec::new();
    egui::Window::new("Edit product")
        .collapsible(false)
        .resizable(true)
        .default_width(520.0)
        .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().max_height(480.0).show(ui, |ui| {
                for (group, fields) in session.layout().iter() {
                    let open = session.expanded.contains(group);
                    let response = egui::CollapsingHeader::new(group)
                        .id_salt(("edit_group", group))
                        .open(Some(open))
                        .show(ui, |ui| {
                            let pager = session.pages.get(&group.to_string());
                            for field in pager.slice(fields) {
                                let key = &field.field_name;
                                let value = session.values.get(key).map(String::as_str).unwrap_or("");
                                if let Some(value) = field_input(
                                    ui,
                                    ("edit_value", key),
                                    key,
                                    registry.find(key),
                                    registry.widget_for(key),
                                    value,
                                ) {
                                    msgs.push(EditMsg::Value {
                                        key: key.clone(),
                                        value,
                                    });
                                }
                                ui.add_space(4.0);
                            }
                            if fields.len() > pager.page_size() {
                                match pager_row(ui, &pager, fields.len()) {
                                    0 => {}
                                    step => msgs.push(EditMsg::GroupPage {
                                        group: group.to_string(),
                                        step,
                                    }),
                                }
                            }
                        });
                    if response.header_response.clicked() {
                        msgs.push(EditMsg::ToggleGroup(group.to_string()));
                    }
                }
            });

            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(
                        !session.saving,
                        egui::Button::new(format!("{} Save", egui_phosphor::regular::FLOPPY_DISK)),
                    )
                    .clicked()
                {
                    msgs.push(EditMsg::Save);
                }
                if ui.button("Cancel").clicked() {
                    msgs.push(EditMsg::Cancel);
                }
                if session.saving {
                    ui.add(egui::Spinner::new().size(14.0));
                }
            });
        });
    msgs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::options::RawOptions;

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

    fn hat() -> Record {
        Record::from_pairs([("title", "Hat"), ("legacy", "x")])
    }

    #[test]
    fn session_keeps_record_only_keys() {
        let session = EditSession::open(2, &hat(), &registry(), 5);
        assert!(session.values.contains_key("legacy"));
        assert!(session.values.contains_key("color"));
        assert_eq!(session.target, None);
        assert_eq!(session.layout().names(), vec!["Looks", "Ungrouped"]);
        assert!(session.expanded.contains("Looks"));
    }

    #[test]
    fn group_toggle_and_paging_stay_in_session() {
        let mut session = EditSession::open(0, &hat(), &registry(), 1);
        update(&mut session, EditMsg::ToggleGroup("Looks".into()));
        assert!(!session.expanded.contains("Looks"));
        update(&mut session, EditMsg::ToggleGroup("Ungrouped".into()));
        assert!(session.expanded.contains("Ungrouped"));

        update(
            &mut session,
            EditMsg::GroupPage {
                group: "Ungrouped".into(),
                step: 1,
            },
        );
        assert_eq!(session.pages.get(&"Ungrouped".to_string()).page(), 1);
        update(&mut session, EditMsg::Save);
        assert!(!session.saving);
    }

    #[test]
    fn pending_changes_validate_then_diff() {
        let reg = registry();
        let mut session = EditSession::open(4, &hat(), &reg, 5);
        assert_eq!(
            session.pending_changes(&reg),
            Err(UiEvent::info("No changes to save."))
        );

        update(
            &mut session,
            EditMsg::Value {
                key: "title".into(),
                value: " ".into(),
            },
        );
        assert_eq!(
            session.pending_changes(&reg),
            Err(UiEvent::error("Field 'title' is required."))
        );

        update(
            &mut session,
            EditMsg::Value {
                key: "title".into(),
                value: "Cap".into(),
            },
        );
        let changes = session.pending_changes(&reg).unwrap();
        assert_eq!(
            session.update_body(changes),
            ProductUpdate::Legacy {
                index: 4,
                fields: BTreeMap::from([("title".to_string(), "Cap".to_string())]),
            }
        );
    }

    #[test]
    fn relocate_follows_identifier_or_unchanged_copy() {
        let reg = registry();
        let shirt = Record::from_pairs([("sku", "A1"), ("title", "Shirt")]);
        let keyed = EditSession::open(0, &shirt, &reg, 5);
        let legacy = EditSession::open(1, &hat(), &reg, 5);

        let shifted = vec![hat(), Record::from_pairs([("title", "Cap")]), shirt.clone()];
        assert_eq!(keyed.relocate(&shifted), Some(2));
        assert_eq!(legacy.relocate(&shifted), Some(0));

        let mut changed = hat();
        changed.set("legacy", "y");
        assert_eq!(legacy.relocate(&[changed]), None);
        assert_eq!(keyed.relocate(&[]), None);
    }
}
