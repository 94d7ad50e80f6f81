//! Page slicing and navigation state.
//!
//! Pages are 1-based. A collection always has at least one page, so an empty
//! feed is "page 1 of 1" rather than "page 1 of 0".
use std::ops::RangeInclusive;

/// Pages shown on each side of the current one in the page window.
pub const WINDOW_RADIUS: usize = 2;

/// One page of a collection.
#[derive(Debug, PartialEq, Eq)]
pub struct Page<'a, T> {
    pub items: &'a [T],
    pub current_page: usize,
    pub total_pages: usize,
}

/// `max(1, ceil(count / page_size))`. A zero page size is treated as one
/// item per page.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Slice out page `current_page` of `items`.
///
/// The range `[(page - 1) * size, page * size)` is clipped to the collection,
/// so a page past the end is empty rather than a panic. Page 0 is read as
/// page 1.
pub fn paginate<T>(items: &[T], page_size: usize, current_page: usize) -> Page<'_, T> {
    let size = page_size.max(1);
    let current_page = current_page.max(1);
    let start = (current_page - 1).saturating_mul(size).min(items.len());
    let end = start.saturating_add(size).min(items.len());
    Page {
        items: &items[start..end],
        current_page,
        total_pages: total_pages(items.len(), size),
    }
}

/// Page numbers to offer as direct links around `current`.
///
/// The window is `[max(1, current - 2), min(total, current + 2)]` and shrinks
/// at the edges instead of sliding.
///
/// # Examples
///
/// ```
/// use newsdeck::feed::page_window;
///
/// assert_eq!(page_window(1, 10), 1..=3);
/// assert_eq!(page_window(5, 10), 3..=7);
/// assert_eq!(page_window(10, 10), 8..=10);
/// ```
pub fn page_window(current: usize, total: usize) -> RangeInclusive<usize> {
    let low = current.saturating_sub(WINDOW_RADIUS).max(1);
    let high = current.saturating_add(WINDOW_RADIUS).min(total);
    low..=high
}

/// Navigation state for one paged view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginator {
    page_size: usize,
    current_page: usize,
    item_count: usize,
}

impl Paginator {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current_page: 1,
            item_count: 0,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.item_count, self.page_size)
    }

    /// The source collection was replaced: record its size and go back to
    /// page 1.
    pub fn reset(&mut self, item_count: usize) {
        self.item_count = item_count;
        self.current_page = 1;
    }

    /// Jump to `target`. Returns false, leaving the page unchanged, when
    /// `target` is outside `1..=total_pages`.
    pub fn change_page(&mut self, target: usize) -> bool {
        if target == 0 || target > self.total_pages() {
            tracing::debug!(target, total = self.total_pages(), "Ignoring out-of-range page");
            return false;
        }
        self.current_page = target;
        true
    }

    pub fn next(&mut self) -> bool {
        self.change_page(self.current_page.saturating_add(1))
    }

    pub fn previous(&mut self) -> bool {
        // Page 1 minus one is 0, which change_page rejects
        self.change_page(self.current_page.saturating_sub(1))
    }

    pub fn window(&self) -> RangeInclusive<usize> {
        page_window(self.current_page, self.total_pages())
    }

    /// Paging controls are only worth showing with more than one page.
    pub fn controls_visible(&self) -> bool {
        self.total_pages() > 1
    }

    /// The current page of `items`, which should be the collection this
    /// paginator was last reset with.
    pub fn page<'a, T>(&self, items: &'a [T]) -> Page<'a, T> {
        paginate(items, self.page_size, self.current_page)
    }
}
