// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Product records: an open map of field name to string value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::field::FieldDefinition;

/// Natural identifier fields, in priority order.
pub const IDENTIFIER_FIELDS: [&str; 5] = ["handle", "sku_primary", "sku", "id", "Product number"];

/// Keys tried, in order, for a human-readable product label.
const TITLE_FIELDS: [&str; 4] = ["primary_title", "title", "Title", "name"];

/// One product as served by the backend.
///
/// Unknown keys pass through untouched. Non-string JSON values are stringified on read
/// (`null` becomes empty).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, Value>")]
pub struct Record(BTreeMap<String, String>);

impl From<BTreeMap<String, Value>> for Record {
    fn from(raw: BTreeMap<String, Value>) -> Self {
        Self(
            raw.into_iter()
                .map(|(k, v)| {
                    let text = match v {
                        Value::Null => String::new(),
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, text)
                })
                .collect(),
        )
    }
}

/// Natural identifier of a record: which field and its value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordId {
    pub field: String,
    pub value: String,
}

impl Record {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    /// Value for `key`; absent keys read as empty.
    pub fn get(&self, key: &str) -> &str {
        self.0.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_filled(&self, key: &str) -> bool {
        !self.get(key).trim().is_empty()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    /// First present, non-blank natural identifier.
    pub fn identifier(&self) -> Option<RecordId> {
        IDENTIFIER_FIELDS.iter().find_map(|field| {
            let value = self.get(field).trim();
            (!value.is_empty()).then(|| RecordId {
                field: (*field).to_string(),
                value: value.to_string(),
            })
        })
    }

    pub fn has_identifier(&self, id: &RecordId) -> bool {
        self.get(&id.field).trim() == id.value
    }

    /// Label for tables and confirmation prompts.
    pub fn display_name(&self) -> String {
        TITLE_FIELDS
            .iter()
            .map(|k| self.get(k).trim())
            .find(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.identifier().map(|id| id.value))
            .unwrap_or_else(|| "(untitled)".to_string())
    }

    /// Case-insensitive substring match against every value.
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.0.values().any(|v| v.to_lowercase().contains(&needle))
    }

    /// Keys whose trimmed edited value differs from the stored one.
    ///
    /// The returned values are trimmed.
    pub fn diff(&self, edited: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        edited
            .iter()
            .filter(|(k, v)| v.trim() != self.get(k).trim())
            .map(|(k, v)| (k.clone(), v.trim().to_string()))
            .collect()
    }

    pub fn apply_updates(&mut self, updates: &BTreeMap<String, String>) {
        for (k, v) in updates {
            self.0.insert(k.clone(), v.clone());
        }
    }

    /// Percentage of `fields` with a non-blank value.
    pub fn completeness(&self, fields: &[FieldDefinition]) -> u32 {
        if fields.is_empty() {
            return 0;
        }
        let filled = fields.iter().filter(|f| self.is_filled(&f.field_name)).count();
        ((filled as f64 / fields.len() as f64) * 100.0).round() as u32
    }
}

/// Locate the cached record carrying `id`.
///
/// When several records share the identifier the first wins and the ambiguity is logged.
pub fn locate(records: &[Record], id: &RecordId) -> Option<usize> {
    let mut hits = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.has_identifier(id))
        .map(|(idx, _)| idx);
    let first = hits.next()?;
    let extra = hits.count();
    if extra > 0 {
        log::warn!(
            "{} records share {}={:?}; using index {first}",
            extra + 1,
            id.field,
            id.value
        );
    }
    Some(first)
}

/// Field names to show when editing `record`.
///
/// Registry names come first in registry order, then any keys only the record has,
/// so no stored data disappears from the editor.
pub fn editable_keys(fields: &[FieldDefinition], record: &Record) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(fields.len());
    for f in fields {
        if !keys.contains(&f.field_name) {
            keys.push(f.field_name.clone());
        }
    }
    for k in record.keys() {
        if !keys.iter().any(|existing| existing == k) {
            keys.push(k.to_string());
        }
    }
    keys
}

#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<Record>,
}

/// Parse a `{ "products": [...] }` payload.
pub fn parse_products_payload(json: &str) -> serde_json::Result<Vec<Record>> {
    let env: ProductsEnvelope = serde_json::from_str(json)?;
    Ok(env.products)
}
