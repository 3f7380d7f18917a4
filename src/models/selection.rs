// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Row selection for bulk operations.

use std::collections::BTreeSet;

/// State of the select-all checkbox for the currently visible rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectAllState {
    None,
    Some,
    All,
}

/// Selected record indices (positions in the product cache).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection(BTreeSet<usize>);

impl Selection {
    pub fn contains(&self, index: usize) -> bool {
        self.0.contains(&index)
    }

    pub fn toggle(&mut self, index: usize) {
        if !self.0.remove(&index) {
            self.0.insert(index);
        }
    }

    /// Select every visible index, or deselect them all when they are already selected.
    pub fn toggle_all(&mut self, visible: &[usize]) {
        if self.state_for(visible) == SelectAllState::All {
            for idx in visible {
                self.0.remove(idx);
            }
        } else {
            self.0.extend(visible.iter().copied());
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Drop indices that no longer exist after the list shrank.
    pub fn retain_below(&mut self, len: usize) {
        self.0.retain(|idx| *idx < len);
    }

    /// Forget `index` after its record was removed; later indices shift down by one.
    pub fn remove_index(&mut self, index: usize) {
        self.0 = self
            .0
            .iter()
            .filter(|idx| **idx != index)
            .map(|idx| if *idx > index { idx - 1 } else { *idx })
            .collect();
    }

    pub fn state_for(&self, visible: &[usize]) -> SelectAllState {
        let selected = visible.iter().filter(|idx| self.0.contains(idx)).count();
        match selected {
            0 => SelectAllState::None,
            n if n == visible.len() => SelectAllState::All,
            _ => SelectAllState::Some,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted indices, as sent to bulk endpoints.
    pub fn indices(&self) -> Vec<usize> {
        self.0.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tri_state_over_visible_rows() {
        let mut sel = Selection::default();
        let visible = [2, 4, 6];
        assert_eq!(sel.state_for(&visible), SelectAllState::None);
        sel.toggle(4);
        assert_eq!(sel.state_for(&visible), SelectAllState::Some);
        sel.toggle_all(&visible);
        assert_eq!(sel.state_for(&visible), SelectAllState::All);
        sel.toggle_all(&visible);
        assert!(sel.is_empty());
        assert_eq!(sel.state_for(&[]), SelectAllState::None);
    }

    #[test]
    fn hidden_selection_does_not_count() {
        let mut sel = Selection::default();
        sel.toggle(9);
        assert_eq!(sel.state_for(&[1, 2]), SelectAllState::None);
        sel.toggle_all(&[1, 2]);
        assert_eq!(sel.indices(), vec![1, 2, 9]);
        sel.retain_below(5);
        assert_eq!(sel.indices(), vec![1, 2]);
    }

    #[test]
    fn removing_a_row_shifts_later_indices() {
        let mut sel = Selection::default();
        for idx in [0, 3, 5] {
            sel.toggle(idx);
        }
        sel.remove_index(3);
        assert_eq!(sel.indices(), vec![0, 4]);
    }
}
