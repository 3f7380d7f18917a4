// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Dynamic input for one custom field: a text box or a choice selector.

use std::collections::BTreeMap;

use eframe::egui;

use crate::models::field::{FieldDefinition, FieldWidget, describe_violation, validate_value};

const UNSELECTED_LABEL: &str = "(none)";

/// Entries of a choice selector: an empty "unselected" entry, the options, and the
/// current value when it is not one of them (so stored data stays visible).
pub fn choice_entries(options: &[String], current: &str) -> Vec<String> {
    let mut entries = Vec::with_capacity(options.len() + 2);
    entries.push(String::new());
    entries.extend(options.iter().cloned());
    if !current.is_empty() && !options.iter().any(|o| o == current) {
        entries.push(current.to_string());
    }
    entries
}

/// First required-field violation among `fields` for the given values.
pub fn first_violation<'a>(
    fields: impl IntoIterator<Item = &'a FieldDefinition>,
    values: &BTreeMap<String, String>,
) -> Option<String> {
    fields.into_iter().find_map(|field| {
        let value = values.get(&field.field_name).map(String::as_str).unwrap_or("");
        validate_value(field, value).map(|code| describe_violation(&field.field_name, code))
    })
}

/// Label text, with `*` for required fields.
pub fn field_label(field_name: &str, required: bool) -> String {
    if required {
        format!("{field_name} *")
    } else {
        field_name.to_string()
    }
}

/// Render a labelled input bound to `value`. Returns the new value when edited.
///
/// `field` is `None` for keys that exist only on a record; those edit as text.
pub fn field_input(
    ui: &mut egui::Ui,
    id_salt: impl std::hash::Hash,
    field_name: &str,
    field: Option<&FieldDefinition>,
    widget: &FieldWidget,
    value: &str,
) -> Option<String> {
    let required = field.is_some_and(|f| f.required);
    let mut changed = None;

    ui.vertical(|ui| {
        ui.horizontal(|ui| {
            ui.label(field_label(field_name, required));
            if let Some(desc) = field.map(|f| f.description.trim()).filter(|d| !d.is_empty()) {
                ui.label(
                    egui::RichText::new(desc)
                        .small()
                        .color(egui::Color32::from_gray(120)),
                );
            }
        });

        match widget {
            FieldWidget::Text => {
                let mut text = value.to_string();
                if ui
                    .add(egui::TextEdit::singleline(&mut text).desired_width(f32::INFINITY))
                    .changed()
                {
                    changed = Some(text);
                }
            }
            FieldWidget::Choice(options) => {
                let shown = if value.is_empty() { UNSELECTED_LABEL } else { value };
                egui::ComboBox::from_id_salt(id_salt)
                    .selected_text(shown)
                    .width(ui.available_width().min(320.0))
                    .show_ui(ui, |ui| {
                        for entry in choice_entries(options, value) {
                            let label = if entry.is_empty() {
                                UNSELECTED_LABEL
                            } else {
                                entry.as_str()
                            };
                            if ui.selectable_label(entry == value, label).clicked() && entry != value {
                                changed = Some(entry.clone());
                            }
                        }
                    });
            }
        }

        if required && value.trim().is_empty() {
            ui.label(
                egui::RichText::new("Required")
                    .small()
                    .color(egui::Color32::from_rgb(200, 80, 80)),
            );
        }
    });

    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn choice_entries_prefix_unselected() {
        let options = vec!["red".to_string(), "blue".to_string()];
        assert_eq!(choice_entries(&options, "red"), vec!["", "red", "blue"]);
        assert_eq!(
            choice_entries(&options, "green"),
            vec!["", "red", "blue", "green"]
        );
        assert_eq!(choice_entries(&[], ""), vec![""]);
    }

    #[test]
    fn first_violation_reports_blank_required_field() {
        let mut title = FieldDefinition::new("Title");
        title.required = true;
        let notes = FieldDefinition::new("Notes");
        let fields = [notes, title];

        let mut values = BTreeMap::new();
        assert_eq!(
            first_violation(&fields, &values),
            Some("Field 'Title' is required.".to_string())
        );
        values.insert("Title".to_string(), "Shirt".to_string());
        assert_eq!(first_violation(&fields, &values), None);
    }

    #[test]
    fn required_label_has_marker() {
        assert_eq!(field_label("Color", true), "Color *");
        assert_eq!(field_label("Color", false), "Color");
    }
}
