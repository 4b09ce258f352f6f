//! Cursor pagination for task listings.

use crate::store::domain::TaskId;

/// Page size used when callers do not choose one.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Keyset page request ordered by task id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Return rows with an id strictly greater than this cursor.
    pub after: Option<TaskId>,
    /// Maximum number of rows.
    pub limit: usize,
}

impl PageRequest {
    /// First page with the given size. A zero size is raised to one.
    #[must_use]
    pub const fn first(limit: usize) -> Self {
        Self {
            after: None,
            limit: if limit == 0 { 1 } else { limit },
        }
    }

    /// Same size, continuing after `cursor`.
    #[must_use]
    pub const fn after(self, cursor: TaskId) -> Self {
        Self {
            after: Some(cursor),
            limit: self.limit,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first(DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the cursor of the next page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// Rows in id order.
    pub items: Vec<T>,
    /// Cursor for the following page; `None` once the listing is exhausted.
    pub next: Option<TaskId>,
}

impl<T> Page<T> {
    /// Builds a page, deriving `next` from the last id when the page is full.
    pub fn from_items(items: Vec<T>, limit: usize, id_of: impl Fn(&T) -> TaskId) -> Self {
        let next = if items.len() >= limit {
            items.last().map(id_of)
        } else {
            None
        };
        Self { items, next }
    }
}
