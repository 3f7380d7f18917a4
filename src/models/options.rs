// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Normalization of raw field options into an ordered list of choices.
//!
//! Backends deliver options in many shapes: pipe- or comma-delimited strings,
//! JSON-ish lists with single quotes, percent-encoded text, or real arrays. Each
//! step of the normalization is a separate function so it can be tested alone.
//! Nothing in here fails; malformed input degrades to best-effort splitting.

use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use serde_json::Value;

/// Raw `options` value as received from the backend.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RawOptions {
    #[default]
    Absent,
    Text(String),
    List(Vec<String>),
}

impl RawOptions {
    /// Build from an arbitrary JSON value (string, array, null, or scalar).
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(s)) => Self::Text(s.clone()),
            Some(Value::Array(items)) => {
                Self::List(items.iter().map(value_to_option_text).collect())
            }
            Some(other) => Self::Text(other.to_string()),
        }
    }

    /// Text form sent back to the backend on writes.
    pub fn to_wire(&self) -> String {
        match self {
            Self::Absent => String::new(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join("|"),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Self::Absent => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.iter().all(|i| i.trim().is_empty()),
        }
    }
}

/// Behaviour switches for [`parse_options_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OptionsPolicy {
    /// Drop repeated options, keeping the first occurrence.
    pub dedupe: bool,
}

const SEPARATORS: [char; 5] = ['|', ',', ';', '\r', '\n'];
const PIPE_GLYPHS: [char; 3] = ['\u{FF5C}', '\u{2502}', '\u{2016}'];

/// Parse raw options with the default policy (duplicates pass through).
pub fn parse_options(raw: &RawOptions) -> Vec<String> {
    parse_options_with(raw, OptionsPolicy::default())
}

/// Parse a plain options string with the default policy.
pub fn parse_options_text(raw: &str) -> Vec<String> {
    parse_text(raw)
}

/// Parse raw options and apply `policy`.
pub fn parse_options_with(raw: &RawOptions, policy: OptionsPolicy) -> Vec<String> {
    let parsed = match raw {
        RawOptions::Absent => Vec::new(),
        RawOptions::Text(s) => parse_text(s),
        RawOptions::List(items) => parse_list(items),
    };
    if policy.dedupe {
        dedupe(parsed)
    } else {
        parsed
    }
}

fn parse_list(items: &[String]) -> Vec<String> {
    match items {
        [] => Vec::new(),
        [single] => {
            let single = single.trim();
            if single.contains(SEPARATORS) {
                parse_text(single)
            } else if single.is_empty() {
                Vec::new()
            } else {
                vec![single.to_string()]
            }
        }
        many => many
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn parse_text(raw: &str) -> Vec<String> {
    let unquoted = strip_quotes(raw.trim());
    if let Some(list) = decode_bracketed(unquoted) {
        return list;
    }
    let decoded = percent_decode_or_keep(unquoted);
    let normalized = normalize_separators(&decoded);
    flatten_parts(split_primary(&normalized))
}

/// Remove one layer of matching surrounding quotes (`"…"` or `'…'`).
pub fn strip_quotes(s: &str) -> &str {
    let quoted = (s.starts_with('"') && s.ends_with('"'))
        || (s.starts_with('\'') && s.ends_with('\''));
    if !quoted {
        return s;
    }
    if s.len() < 2 {
        return "";
    }
    s[1..s.len() - 1].trim()
}

/// Decode a single-line bracketed list, tolerating single-quoted pseudo-JSON.
///
/// Returns `None` when the input is not bracketed or does not decode to an array.
pub fn decode_bracketed(s: &str) -> Option<Vec<String>> {
    if !(s.starts_with('[') && s.ends_with(']')) || s.contains('\n') {
        return None;
    }
    let relaxed = s.replace('\'', "\"");
    let items: Vec<Value> = serde_json::from_str(&relaxed).ok()?;
    Some(
        items
            .iter()
            .map(value_to_option_text)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Percent-decode `s`; a malformed escape or invalid UTF-8 keeps the input as-is.
pub fn percent_decode_or_keep(s: &str) -> Cow<'_, str> {
    if !has_only_valid_escapes(s) {
        return Cow::Borrowed(s);
    }
    match percent_decode_str(s).decode_utf8() {
        Ok(decoded) => decoded,
        Err(_) => Cow::Borrowed(s),
    }
}

fn has_only_valid_escapes(s: &str) -> bool {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|pair| pair.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Unescape `\|` and `\,`, turn `"a" , "b"` joins into pipes, and map
/// look-alike pipe glyphs to ASCII `|`.
pub fn normalize_separators(s: &str) -> String {
    let unescaped = s.replace("\\|", "|").replace("\\,", ",");
    let joined = replace_quoted_comma_joins(&unescaped);
    joined
        .chars()
        .map(|c| if PIPE_GLYPHS.contains(&c) { '|' } else { c })
        .collect()
}

/// Replace every `"<ws>,<ws>"` sequence with `|`.
fn replace_quoted_comma_joins(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '"'
            && let Some(end) = quoted_join_end(&chars, i)
        {
            out.push('|');
            i = end + 1;
            continue;
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

fn quoted_join_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    if chars.get(j) != Some(&',') {
        return None;
    }
    j += 1;
    while j < chars.len() && chars[j].is_whitespace() {
        j += 1;
    }
    (chars.get(j) == Some(&'"')).then_some(j)
}

/// Split on `|`; when that yields at most one part, split on newline, `;` or `,`.
pub fn split_primary(s: &str) -> Vec<String> {
    let parts = trimmed_parts(s.split('|'));
    if parts.len() > 1 {
        return parts;
    }
    trimmed_parts(s.split(['\r', '\n', ';', ',']))
}

/// Re-split any part that still carries a separator and flatten the result.
pub fn flatten_parts(parts: Vec<String>) -> Vec<String> {
    let mut out = Vec::with_capacity(parts.len());
    for part in parts {
        if part.contains(['|', ',', ';']) {
            out.extend(trimmed_parts(part.split(SEPARATORS)));
        } else if !part.is_empty() {
            out.push(part);
        }
    }
    out
}

fn trimmed_parts<'a>(parts: impl Iterator<Item = &'a str>) -> Vec<String> {
    parts
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

fn dedupe(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn value_to_option_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
