// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Grouping of field definitions into display categories.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::models::field::FieldDefinition;
use crate::models::record::Record;

/// Sentinel group for fields without a category.
pub const DEFAULT_GROUP: &str = "Ungrouped";

/// Ordered `group -> fields` view.
///
/// Groups sort ascending by name except the default group, which is always last.
/// Fields keep their source order inside a group. Duplicate field names are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupedFields {
    groups: Vec<(String, Vec<FieldDefinition>)>,
    default_group: String,
}

impl GroupedFields {
    pub fn from_fields(fields: &[FieldDefinition]) -> Self {
        Self::from_fields_with(fields, DEFAULT_GROUP)
    }

    /// Group `fields`, assigning blank groups to `default_group`.
    pub fn from_fields_with(fields: &[FieldDefinition], default_group: &str) -> Self {
        let mut buckets: BTreeMap<String, Vec<FieldDefinition>> = BTreeMap::new();
        for field in fields {
            buckets
                .entry(group_key(field, default_group))
                .or_default()
                .push(field.clone());
        }
        let mut groups: Vec<(String, Vec<FieldDefinition>)> = buckets.into_iter().collect();
        groups.sort_by(|(a, _), (b, _)| compare_groups(a, b, default_group));
        Self {
            groups,
            default_group: default_group.to_string(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[FieldDefinition])> {
        self.groups
            .iter()
            .map(|(name, fields)| (name.as_str(), fields.as_slice()))
    }

    pub fn names(&self) -> Vec<&str> {
        self.groups.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn get(&self, name: &str) -> Option<&[FieldDefinition]> {
        self.groups
            .iter()
            .find(|(g, _)| g == name)
            .map(|(_, fields)| fields.as_slice())
    }

    /// All fields in group order.
    pub fn flatten(&self) -> Vec<&FieldDefinition> {
        self.groups.iter().flat_map(|(_, f)| f.iter()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn default_group(&self) -> &str {
        &self.default_group
    }

    /// Fill rate of every group across `records`.
    pub fn fill_stats(&self, records: &[Record]) -> Vec<(String, FillStats)> {
        self.iter()
            .map(|(name, fields)| {
                let names: Vec<&str> = fields.iter().map(|f| f.field_name.as_str()).collect();
                (name.to_string(), FillStats::over(&names, records))
            })
            .collect()
    }
}

/// Group name of a field after trimming; blank maps to `default_group`.
pub fn group_key(field: &FieldDefinition, default_group: &str) -> String {
    let trimmed = field.group.trim();
    if trimmed.is_empty() {
        default_group.to_string()
    } else {
        trimmed.to_string()
    }
}

fn compare_groups(a: &str, b: &str, default_group: &str) -> Ordering {
    match (a == default_group, b == default_group) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.cmp(b),
    }
}

/// Filled cells versus total cells for a set of fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FillStats {
    pub filled: usize,
    pub total: usize,
}

impl FillStats {
    pub fn over(field_names: &[&str], records: &[Record]) -> Self {
        let total = field_names.len() * records.len();
        let filled = records
            .iter()
            .map(|r| field_names.iter().filter(|name| r.is_filled(name)).count())
            .sum();
        Self { filled, total }
    }

    /// Rounded percentage; zero when there is nothing to fill.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.filled as f64 / self.total as f64) * 100.0).round() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(name: &str, group: &str) -> FieldDefinition {
        FieldDefinition {
            group: group.into(),
            ..FieldDefinition::new(name)
        }
    }

    #[test]
    fn default_group_sorts_last() {
        let fields = vec![
            field("a", ""),
            field("b", "Zeta"),
            field("c", "  Alpha "),
            field("d", "Beta"),
            field("e", "Alpha"),
        ];
        let grouped = GroupedFields::from_fields(&fields);
        assert_eq!(grouped.names(), vec!["Alpha", "Beta", "Zeta", DEFAULT_GROUP]);
        let alpha: Vec<&str> = grouped
            .get("Alpha")
            .unwrap()
            .iter()
            .map(|f| f.field_name.as_str())
            .collect();
        assert_eq!(alpha, vec!["c", "e"]);
    }

    #[test]
    fn flatten_keeps_every_field() {
        let fields = vec![
            field("x", "B"),
            field("x", "A"),
            field("y", ""),
            field("z", "B"),
        ];
        let grouped = GroupedFields::from_fields(&fields);
        assert_eq!(grouped.flatten().len(), fields.len());
        assert!(GroupedFields::from_fields(&[]).is_empty());
    }

    #[test]
    fn custom_default_group_name() {
        let fields = vec![field("a", ""), field("b", "Misc"), field("c", "Other")];
        let grouped = GroupedFields::from_fields_with(&fields, "Other");
        assert_eq!(grouped.names(), vec!["Misc", "Other"]);
        assert_eq!(grouped.get("Other").unwrap().len(), 2);
    }

    #[test]
    fn grouping_is_deterministic() {
        let fields = vec![field("a", "Q"), field("b", ""), field("c", "P")];
        assert_eq!(
            GroupedFields::from_fields(&fields),
            GroupedFields::from_fields(&fields)
        );
    }

    #[test]
    fn fill_stats_count_non_blank_cells() {
        let fields = vec![field("color", "Looks"), field("size", "Looks"), field("sku", "")];
        let grouped = GroupedFields::from_fields(&fields);
        let records = vec![
            Record::from_pairs([("color", "red"), ("size", " "), ("sku", "1")]),
            Record::from_pairs([("color", "blue"), ("sku", "2")]),
        ];
        let stats = grouped.fill_stats(&records);
        assert_eq!(stats[0].0, "Looks");
        assert_eq!(stats[0].1, FillStats { filled: 2, total: 4 });
        assert_eq!(stats[0].1.percent(), 50);
        assert_eq!(stats[1].1.percent(), 100);
        assert_eq!(FillStats::default().percent(), 0);
    }
}
