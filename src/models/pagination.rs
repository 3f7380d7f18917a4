// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 pimdesk contributors

//! Client-side pagination over in-memory lists.

use std::collections::BTreeMap;
use std::ops::Range;

/// Fixed-size page window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Paginator {
    page: usize,
    page_size: usize,
}

impl Default for Paginator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl Paginator {
    /// A page size of zero is treated as one.
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn can_prev(&self) -> bool {
        self.page > 0
    }

    pub fn can_next(&self, len: usize) -> bool {
        (self.page + 1) * self.page_size < len
    }

    pub fn next(&mut self, len: usize) {
        if self.can_next(len) {
            self.page += 1;
        }
    }

    pub fn prev(&mut self) {
        if self.can_prev() {
            self.page -= 1;
        }
    }

    pub fn reset(&mut self) {
        self.page = 0;
    }

    /// Pull the page back onto the last page after the list shrank.
    pub fn clamp(&mut self, len: usize) {
        let last = self.page_count(len).saturating_sub(1);
        if self.page > last {
            self.page = last;
        }
    }

    pub fn page_count(&self, len: usize) -> usize {
        len.div_ceil(self.page_size)
    }

    /// Index range of the current page within a list of `len` items.
    pub fn range(&self, len: usize) -> Range<usize> {
        let start = (self.page * self.page_size).min(len);
        let end = (start + self.page_size).min(len);
        start..end
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.range(items.len())]
    }

    /// "Page N of M" label; an empty list still reads as page 1 of 1.
    pub fn label(&self, len: usize) -> String {
        format!(
            "Page {} of {}",
            self.page + 1,
            self.page_count(len).max(1)
        )
    }
}

/// Independent paginators keyed by group, record, or anything ordered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageBook<K: Ord> {
    pages: BTreeMap<K, Paginator>,
    page_size: usize,
}

impl<K: Ord> PageBook<K> {
    pub fn new(page_size: usize) -> Self {
        Self {
            pages: BTreeMap::new(),
            page_size: page_size.max(1),
        }
    }

    /// Paginator for `key`, starting on page 0 the first time.
    pub fn get(&self, key: &K) -> Paginator {
        self.pages
            .get(key)
            .copied()
            .unwrap_or_else(|| Paginator::new(self.page_size))
    }

    pub fn entry(&mut self, key: K) -> &mut Paginator {
        let size = self.page_size;
        self.pages.entry(key).or_insert_with(|| Paginator::new(size))
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_no_ops() {
        let mut p = Paginator::new(3);
        assert!(!p.can_prev());
        p.prev();
        assert_eq!(p.page(), 0);

        assert!(p.can_next(7));
        p.next(7);
        p.next(7);
        assert_eq!(p.page(), 2);
        assert!(!p.can_next(7));
        p.next(7);
        assert_eq!(p.page(), 2);
        assert_eq!(p.range(7), 6..7);
        assert_eq!(p.label(7), "Page 3 of 3");
    }

    #[test]
    fn exact_multiple_has_no_extra_page() {
        let mut p = Paginator::new(5);
        p.next(10);
        assert_eq!(p.page(), 1);
        assert!(!p.can_next(10));
        assert_eq!(p.page_count(10), 2);
        assert_eq!(p.page_count(0), 0);
        assert_eq!(p.label(0), "Page 1 of 1");
    }

    #[test]
    fn pages_reproduce_the_list() {
        let items: Vec<u32> = (0..23).collect();
        let mut p = Paginator::new(4);
        let mut seen = Vec::new();
        loop {
            let page = p.slice(&items);
            assert!(page.len() <= p.page_size());
            seen.extend_from_slice(page);
            if !p.can_next(items.len()) {
                break;
            }
            p.next(items.len());
        }
        assert_eq!(seen, items);
    }

    #[test]
    fn shrinking_list_clamps_to_last_page() {
        let mut p = Paginator::new(2);
        for _ in 0..4 {
            p.next(10);
        }
        assert_eq!(p.page(), 4);
        p.clamp(5);
        assert_eq!(p.page(), 2);
        p.clamp(0);
        assert_eq!(p.page(), 0);
        assert!(p.slice::<u8>(&[]).is_empty());
    }

    #[test]
    fn zero_page_size_is_one() {
        assert_eq!(Paginator::new(0).page_size(), 1);
    }

    #[test]
    fn page_book_keeps_independent_pages() {
        let mut book: PageBook<String> = PageBook::new(2);
        book.entry("Looks".into()).next(6);
        assert_eq!(book.get(&"Looks".to_string()).page(), 1);
        assert_eq!(book.get(&"Other".to_string()).page(), 0);
        book.clear();
        assert_eq!(book.get(&"Looks".to_string()).page(), 0);
    }
}
