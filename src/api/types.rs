// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Request bodies and response interpretation for the PIM REST API.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::api::error::ApiError;
use crate::models::field::{FieldDefinition, flag_to_wire};
use crate::models::record::RecordId;

/// Body of `/add_field`, and the field part of `/update_field`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldPayload {
    pub field_name: String,
    pub required: &'static str,
    pub description: String,
    pub options: String,
    pub group: String,
}

impl From<&FieldDefinition> for FieldPayload {
    fn from(field: &FieldDefinition) -> Self {
        Self {
            field_name: field.field_name.trim().to_string(),
            required: flag_to_wire(field.required),
            description: field.description.clone(),
            options: field.options.to_wire(),
            group: field.group.trim().to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldUpdatePayload {
    pub index: usize,
    #[serde(flatten)]
    pub field: FieldPayload,
}

/// How a product is addressed on the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductRef {
    /// Position in the backend list (legacy endpoints).
    Index(usize),
    /// Natural identifier, e.g. `sku=A1`.
    Id(RecordId),
}

impl ProductRef {
    pub fn to_json(&self) -> Value {
        match self {
            Self::Index(index) => json!({ "index": index }),
            Self::Id(id) => json!({ "identifier_field": id.field, "id": id.value }),
        }
    }
}

/// Body of `/update_product`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductUpdate {
    /// `{index, ...fields}`
    Legacy {
        index: usize,
        fields: BTreeMap<String, String>,
    },
    /// `{identifier_field, id, updates}`
    Keyed {
        id: RecordId,
        updates: BTreeMap<String, String>,
    },
}

impl ProductUpdate {
    pub fn updates(&self) -> &BTreeMap<String, String> {
        match self {
            Self::Legacy { fields, .. } => fields,
            Self::Keyed { updates, .. } => updates,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Legacy { index, fields } => {
                let mut body: Map<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                body.insert("index".into(), json!(index));
                Value::Object(body)
            }
            Self::Keyed { id, updates } => json!({
                "identifier_field": id.field,
                "id": id.value,
                "updates": updates,
            }),
        }
    }
}

/// Body of `/add_product`: the field map plus `primary_title`.
pub fn new_product_body(primary_title: &str, values: &BTreeMap<String, String>) -> Value {
    let mut body: Map<String, Value> = values
        .iter()
        .map(|(k, v)| (k.clone(), Value::String(v.clone())))
        .collect();
    body.insert("primary_title".into(), Value::String(primary_title.trim().to_string()));
    Value::Object(body)
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub query: String,
    #[serde(rename = "fieldKey")]
    pub field_key: String,
    #[serde(rename = "fieldValue")]
    pub field_value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkEdit {
    pub indices: Vec<usize>,
    pub field: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BulkDelete {
    pub indices: Vec<usize>,
}

/// Generic `{success, message?}` acknowledgement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

impl Ack {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref().or(self.detail.as_deref())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Pull a human-readable message out of an error body.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "detail", "error"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

/// Decode a JSON body, mapping non-2xx statuses to [`ApiError::Status`].
pub fn interpret_json<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, ApiError> {
    if !is_success(status) {
        return Err(ApiError::Status {
            status,
            message: error_message(body),
        });
    }
    serde_json::from_str(body).map_err(|err| ApiError::InvalidResponse(err.to_string()))
}

/// Decode an acknowledgement; `success: false` becomes [`ApiError::Rejected`].
pub fn interpret_ack(status: u16, body: &str) -> Result<Ack, ApiError> {
    let ack: Ack = interpret_json(status, body)?;
    if ack.success {
        Ok(ack)
    } else {
        Err(ApiError::Rejected {
            message: ack.message().map(str::to_string),
        })
    }
}
