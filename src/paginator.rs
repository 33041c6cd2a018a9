//! Fixed-size, 1-indexed pages over an already ordered feed.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

/// What [`Pager::go_to`] does with a page outside `1..=total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutOfRange {
    /// Leave the current page alone.
    #[default]
    Ignore,
    /// Move to the nearest page that exists.
    Clamp,
}

/// What happens to the current page when a refresh leaves fewer pages than
/// the current page number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShrinkPolicy {
    /// Move to the last remaining page.
    #[default]
    Clamp,
    /// Keep the stale page number until the user navigates.
    Stale,
}

/// The visible part of a feed.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub total_pages: usize,
    /// Always within `1..=max(total_pages, 1)`.
    pub current: usize,
}

pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get())
}

/// Clamps `page` into `1..=total_pages`. With no pages at all that is page 1.
pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// Cuts page `requested` out of `items`, clamping it to a page that exists.
pub fn paginate<T>(items: &[T], page_size: NonZeroUsize, requested: usize) -> Page<'_, T> {
    let total_pages = total_pages(items.len(), page_size);
    let current = clamp_page(requested, total_pages);
    let start = (current - 1) * page_size.get();
    let end = (start + page_size.get()).min(items.len());

    Page {
        items: items.get(start..end).unwrap_or_default(),
        total_pages,
        current,
    }
}

/// Navigation state: the current page and the rules for moving it.
///
/// The navigation methods take the feed's current page count and return
/// whether the current page changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pager {
    current: usize,
    page_size: NonZeroUsize,
    out_of_range: OutOfRange,
    on_shrink: ShrinkPolicy,
}

impl Pager {
    pub fn new(page_size: NonZeroUsize) -> Self {
        Self {
            current: 1,
            page_size,
            out_of_range: OutOfRange::default(),
            on_shrink: ShrinkPolicy::default(),
        }
    }

    pub fn out_of_range(self, out_of_range: OutOfRange) -> Self {
        Self {
            out_of_range,
            ..self
        }
    }

    pub fn on_shrink(self, on_shrink: ShrinkPolicy) -> Self {
        Self { on_shrink, ..self }
    }

    /// The stored page number. Under [`ShrinkPolicy::Stale`] this may point
    /// past the last page.
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self, len: usize) -> usize {
        total_pages(len, self.page_size)
    }

    pub fn is_stale(&self, total_pages: usize) -> bool {
        self.current != clamp_page(self.current, total_pages)
    }

    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        paginate(items, self.page_size, self.current)
    }

    pub fn go_to(&mut self, page: usize, total_pages: usize) -> bool {
        let target = if (1..=total_pages).contains(&page) {
            page
        } else {
            match self.out_of_range {
                OutOfRange::Ignore => return false,
                OutOfRange::Clamp => clamp_page(page, total_pages),
            }
        };
        self.set(target)
    }

    pub fn next(&mut self, total_pages: usize) -> bool {
        let current = clamp_page(self.current, total_pages);
        if current < total_pages {
            self.set(current + 1)
        } else {
            false
        }
    }

    pub fn prev(&mut self, total_pages: usize) -> bool {
        let current = clamp_page(self.current, total_pages);
        if current > 1 {
            self.set(current - 1)
        } else {
            false
        }
    }

    /// Applies the shrink policy after the feed changed size.
    pub fn feed_resized(&mut self, total_pages: usize) -> bool {
        match self.on_shrink {
            ShrinkPolicy::Clamp => self.set(clamp_page(self.current, total_pages)),
            ShrinkPolicy::Stale => false,
        }
    }

    fn set(&mut self, page: usize) -> bool {
        let changed = self.current != page;
        self.current = page;
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    #[test]
    fn test_five_messages_in_pages_of_two() {
        let feed = ["m5", "m4", "m3", "m2", "m1"];

        let page = paginate(&feed, size(2), 1);
        assert_eq!(page.items, ["m5", "m4"]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(paginate(&feed, size(2), 2).items, ["m3", "m2"]);
        assert_eq!(paginate(&feed, size(2), 3).items, ["m1"]);
    }

    #[test]
    fn test_pages_partition_the_feed() {
        for len in 0..=30 {
            let feed: Vec<usize> = (0..len).collect();
            for p in 1..=7 {
                let total = total_pages(len, size(p));
                assert_eq!(total, (len + p - 1) / p);

                let mut joined = Vec::new();
                for n in 1..=total {
                    let page = paginate(&feed, size(p), n);
                    assert_eq!(page.current, n);
                    if n < total {
                        assert_eq!(page.items.len(), p);
                    } else {
                        assert!((1..=p).contains(&page.items.len()));
                    }
                    joined.extend_from_slice(page.items);
                }
                assert_eq!(joined, feed, "len {len}, page size {p}");
            }
        }
    }

    #[test]
    fn test_empty_feed() {
        let feed: [u8; 0] = [];
        let page = paginate(&feed, size(5), 1);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.current, 1);
        assert!(page.items.is_empty());

        let mut pager = Pager::new(size(5));
        assert!(!pager.next(0));
        assert!(!pager.prev(0));
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn test_requested_page_is_clamped() {
        let feed = [1, 2, 3];
        let page = paginate(&feed, size(2), 0);
        assert_eq!(page.current, 1);
        assert_eq!(page.items, [1, 2]);

        let page = paginate(&feed, size(2), 9);
        assert_eq!(page.current, 2);
        assert_eq!(page.items, [3]);
    }

    #[test]
    fn test_go_to_out_of_range_is_ignored() {
        let mut pager = Pager::new(size(2));
        assert!(pager.go_to(2, 3));

        assert!(!pager.go_to(0, 3));
        assert_eq!(pager.current(), 2);
        assert!(!pager.go_to(4, 3));
        assert_eq!(pager.current(), 2);
    }

    #[test]
    fn test_go_to_out_of_range_is_clamped() {
        let mut pager = Pager::new(size(2)).out_of_range(OutOfRange::Clamp);
        assert!(pager.go_to(2, 3));

        assert!(pager.go_to(0, 3));
        assert_eq!(pager.current(), 1);
        assert!(pager.go_to(4, 3));
        assert_eq!(pager.current(), 3);

        // no pages at all
        assert!(pager.go_to(1, 0));
        assert_eq!(pager.current(), 1);
        assert!(!pager.go_to(2, 0));
        assert_eq!(pager.current(), 1);
    }

    #[test]
    fn test_next_and_prev_stop_at_boundaries() {
        let mut pager = Pager::new(size(2));
        assert!(!pager.prev(3));
        assert!(pager.next(3));
        assert!(pager.next(3));
        assert_eq!(pager.current(), 3);
        assert!(!pager.next(3));
        assert!(pager.prev(3));
        assert_eq!(pager.current(), 2);
    }

    #[test]
    fn test_shrink_clamps() {
        let mut pager = Pager::new(size(2));
        pager.go_to(3, 3);

        assert!(pager.feed_resized(2));
        assert_eq!(pager.current(), 2);
        assert!(!pager.is_stale(2));
    }

    #[test]
    fn test_shrink_leaves_stale_page() {
        let mut pager = Pager::new(size(2)).on_shrink(ShrinkPolicy::Stale);
        pager.go_to(3, 3);

        assert!(!pager.feed_resized(1));
        assert_eq!(pager.current(), 3);
        assert!(pager.is_stale(1));

        // what is shown is still a real page
        let feed = ["only"];
        let page = pager.page(&feed);
        assert_eq!(page.current, 1);
        assert_eq!(page.items, ["only"]);

        // navigating moves relative to the page being shown
        assert!(!pager.next(1));
        assert!(pager.go_to(1, 1));
        assert!(!pager.is_stale(1));
    }
}
