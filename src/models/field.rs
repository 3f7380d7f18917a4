// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Custom field definitions served by the PIM backend.
//! Parsing is kept pure so it can be reused by every page that renders fields.

use serde::Deserialize;
use serde_json::Value;

use crate::models::grouping::{DEFAULT_GROUP, GroupedFields};
use crate::models::options::{OptionsPolicy, RawOptions, parse_options_with};

/// One backend-configured custom attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldDefinition {
    pub field_name: String,
    pub required: bool,
    pub description: String,
    pub options: RawOptions,
    /// Display category; empty means the default group.
    pub group: String,
}

impl FieldDefinition {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            ..Default::default()
        }
    }

    /// Widget used to edit this field, derived from its options.
    pub fn widget(&self, policy: OptionsPolicy) -> FieldWidget {
        let options = parse_options_with(&self.options, policy);
        if options.is_empty() {
            FieldWidget::Text
        } else {
            FieldWidget::Choice(options)
        }
    }
}

/// How a field value is edited.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldWidget {
    Text,
    Choice(Vec<String>),
}

static TEXT_WIDGET: FieldWidget = FieldWidget::Text;

/// Check a value against its field definition.
///
/// Returns `Some("required")` when a required field is blank; `None` otherwise.
pub fn validate_value(field: &FieldDefinition, value: &str) -> Option<&'static str> {
    if field.required && value.trim().is_empty() {
        return Some("required");
    }
    None
}

/// Human-readable message for a reason code from [`validate_value`].
pub fn describe_violation(field_name: &str, code: &str) -> String {
    match code {
        "required" => format!("Field '{field_name}' is required."),
        _ => format!("Field '{field_name}' is invalid."),
    }
}

#[derive(Debug, Deserialize)]
struct FieldsEnvelope {
    #[serde(default)]
    fields: Vec<FieldDefinitionRaw>,
}

#[derive(Debug, Deserialize)]
struct FieldDefinitionRaw {
    #[serde(default)]
    field_name: Option<Value>,
    #[serde(default)]
    required: Option<Value>,
    #[serde(default)]
    description: Option<Value>,
    #[serde(default)]
    options: Option<Value>,
    #[serde(default)]
    group: Option<Value>,
}

impl From<FieldDefinitionRaw> for FieldDefinition {
    fn from(raw: FieldDefinitionRaw) -> Self {
        Self {
            field_name: value_to_string(raw.field_name.as_ref()).trim().to_string(),
            required: flag_from_value(raw.required.as_ref()),
            description: value_to_string(raw.description.as_ref()),
            options: RawOptions::from_value(raw.options.as_ref()),
            group: value_to_string(raw.group.as_ref()).trim().to_string(),
        }
    }
}

/// Parse a `{ "fields": [...] }` payload.
///
/// Entries without a name are dropped; everything else is normalized
/// (required flags from bool or `"True"`-style strings, options from string or array).
pub fn parse_fields_payload(json: &str) -> serde_json::Result<Vec<FieldDefinition>> {
    let env: FieldsEnvelope = serde_json::from_str(json)?;
    Ok(env
        .fields
        .into_iter()
        .map(FieldDefinition::from)
        .filter(|f| !f.field_name.is_empty())
        .collect())
}

/// Interpret the loose truthiness used by the backend for `required`.
pub fn flag_from_value(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "true" | "yes" | "y" | "1" | "on"
        ),
        _ => false,
    }
}

/// Wire form of a required flag.
pub fn flag_to_wire(flag: bool) -> &'static str {
    if flag { "True" } else { "False" }
}

fn value_to_string(val: Option<&Value>) -> String {
    match val {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Cached field list plus the views derived from it.
///
/// Derived data (widgets, grouping) is recomputed only in [`FieldRegistry::replace`]
/// and the other mutators, so renderers can borrow it every frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldRegistry {
    fields: Vec<FieldDefinition>,
    widgets: Vec<FieldWidget>,
    grouped: GroupedFields,
    policy: OptionsPolicy,
    default_group: String,
    revision: u64,
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::new(OptionsPolicy::default(), DEFAULT_GROUP)
    }
}

impl FieldRegistry {
    pub fn new(policy: OptionsPolicy, default_group: &str) -> Self {
        Self {
            fields: Vec::new(),
            widgets: Vec::new(),
            grouped: GroupedFields::default(),
            policy,
            default_group: default_group.to_string(),
            revision: 0,
        }
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn grouped(&self) -> &GroupedFields {
        &self.grouped
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Bumped every time the field list changes.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldDefinition> {
        self.fields.get(index)
    }

    pub fn find(&self, field_name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.field_name == field_name)
    }

    /// Widget for the field at `index`.
    pub fn widget(&self, index: usize) -> &FieldWidget {
        self.widgets.get(index).unwrap_or(&TEXT_WIDGET)
    }

    /// Widget for the named field; unknown names edit as text.
    pub fn widget_for(&self, field_name: &str) -> &FieldWidget {
        self.fields
            .iter()
            .position(|f| f.field_name == field_name)
            .map(|idx| self.widget(idx))
            .unwrap_or(&TEXT_WIDGET)
    }

    /// Distinct non-empty group names in source order.
    pub fn existing_groups(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for field in &self.fields {
            let g = field.group.trim();
            if !g.is_empty() && !out.iter().any(|o| o == g) {
                out.push(g.to_string());
            }
        }
        out
    }

    pub fn replace(&mut self, fields: Vec<FieldDefinition>) {
        self.fields = fields;
        self.rebuild();
    }

    pub fn set(&mut self, index: usize, field: FieldDefinition) -> bool {
        match self.fields.get_mut(index) {
            Some(slot) => {
                *slot = field;
                self.rebuild();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, index: usize) -> Option<FieldDefinition> {
        if index >= self.fields.len() {
            return None;
        }
        let removed = self.fields.remove(index);
        self.rebuild();
        Some(removed)
    }

    fn rebuild(&mut self) {
        self.widgets = self.fields.iter().map(|f| f.widget(self.policy)).collect();
        self.grouped = GroupedFields::from_fields_with(&self.fields, &self.default_group);
        self.revision += 1;
        let duplicates = duplicate_names(&self.fields);
        if !duplicates.is_empty() {
            log::warn!("field registry contains duplicate names: {duplicates:?}");
        }
    }
}

fn duplicate_names(fields: &[FieldDefinition]) -> Vec<&str> {
    let mut seen = std::collections::HashSet::new();
    let mut dups = Vec::new();
    for f in fields {
        if !seen.insert(f.field_name.as_str()) && !dups.contains(&f.field_name.as_str()) {
            dups.push(f.field_name.as_str());
        }
    }
    dups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_backend_field_payload() {
        let json = r#"{"fields":[
            {"field_name":"Color","required":"True","description":"Main colour","options":"red|blue","group":" Looks "},
            {"field_name":"Weight","required":false,"options":null},
            {"field_name":"Sizes","options":["S","M"],"group":""},
            {"description":"nameless"}
        ],"count":4}"#;

        let fields = parse_fields_payload(json).unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].field_name, "Color");
        assert!(fields[0].required);
        assert_eq!(fields[0].group, "Looks");
        assert_eq!(fields[0].options, RawOptions::Text("red|blue".into()));
        assert!(!fields[1].required);
        assert_eq!(fields[1].options, RawOptions::Absent);
        assert_eq!(
            fields[2].options,
            RawOptions::List(vec!["S".into(), "M".into()])
        );
    }

    #[test]
    fn missing_fields_key_is_empty() {
        assert!(parse_fields_payload("{}").unwrap().is_empty());
        assert!(parse_fields_payload("not json").is_err());
    }

    #[test]
    fn required_flag_accepts_loose_truthiness() {
        for truthy in [
            serde_json::json!(true),
            serde_json::json!("True"),
            serde_json::json!("yes"),
            serde_json::json!(1),
        ] {
            assert!(flag_from_value(Some(&truthy)), "{truthy}");
        }
        for falsy in [
            serde_json::json!(false),
            serde_json::json!("False"),
            serde_json::json!(""),
            serde_json::json!(0),
        ] {
            assert!(!flag_from_value(Some(&falsy)), "{falsy}");
        }
        assert!(!flag_from_value(None));
        assert_eq!(flag_to_wire(true), "True");
    }

    #[test]
    fn widget_follows_options() {
        let mut field = FieldDefinition::new("Color");
        assert_eq!(field.widget(OptionsPolicy::default()), FieldWidget::Text);
        field.options = RawOptions::Text("red, blue".into());
        assert_eq!(
            field.widget(OptionsPolicy::default()),
            FieldWidget::Choice(vec!["red".into(), "blue".into()])
        );
    }

    #[test]
    fn required_blank_values_are_rejected() {
        let mut field = FieldDefinition::new("Title");
        assert_eq!(validate_value(&field, ""), None);
        field.required = true;
        assert_eq!(validate_value(&field, "  "), Some("required"));
        assert_eq!(validate_value(&field, "x"), None);
        assert_eq!(
            describe_violation("Title", "required"),
            "Field 'Title' is required."
        );
    }

    #[test]
    fn registry_recomputes_derived_views() {
        let mut registry = FieldRegistry::default();
        let rev = registry.revision();
        let mut color = FieldDefinition::new("Color");
        color.options = RawOptions::Text("red|blue".into());
        color.group = "Looks".into();
        registry.replace(vec![color, FieldDefinition::new("Notes")]);

        assert!(registry.revision() > rev);
        assert_eq!(registry.grouped().names(), vec!["Looks", DEFAULT_GROUP]);
        assert!(matches!(registry.widget_for("Color"), FieldWidget::Choice(_)));
        assert_eq!(registry.widget_for("Notes"), &FieldWidget::Text);
        assert_eq!(registry.widget_for("Unknown"), &FieldWidget::Text);
        assert_eq!(registry.existing_groups(), vec!["Looks".to_string()]);

        let removed = registry.remove(0).unwrap();
        assert_eq!(removed.field_name, "Color");
        assert_eq!(registry.grouped().names(), vec![DEFAULT_GROUP]);
        assert!(registry.remove(5).is_none());
    }

    #[test]
    fn duplicate_names_are_kept() {
        let mut registry = FieldRegistry::default();
        let mut a = FieldDefinition::new("Size");
        a.group = "A".into();
        let mut b = FieldDefinition::new("Size");
        b.group = "B".into();
        registry.replace(vec![a, b]);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.grouped().flatten().len(), 2);
    }
}
