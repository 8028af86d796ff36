//! Offset-based pagination engine.
//!
//! [`paginate`] is a pure function: it validates the page size, derives the
//! page count, clamps the requested page, and returns a [`PageWindow`] that
//! tells the caller which `offset`/`limit` to fetch. The fetched items are
//! then packaged with [`PageWindow::into_page`].
//!
//! # Algorithm
//!
//! 1. `total_pages = ceil(total_items / page_size)`, `0` for an empty collection.
//! 2. `page_number = clamp(requested, 1, max(total_pages, 1))`.
//! 3. `offset = (page_number - 1) * page_size`.
//!
//! Out-of-range pages are redirected to the nearest valid page, never
//! rejected. Page sizes outside [`ALLOWED_PAGE_SIZES`] are rejected.

use serde::Serialize;

use crate::error::ViewerError;

/// Page sizes accepted by [`paginate`].
pub const ALLOWED_PAGE_SIZES: [u32; 3] = [10, 50, 100];

/// A validated page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize(u32);

impl PageSize {
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for PageSize {
    fn default() -> Self {
        Self(ALLOWED_PAGE_SIZES[0])
    }
}

impl TryFrom<u32> for PageSize {
    type Error = ViewerError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if ALLOWED_PAGE_SIZES.contains(&value) {
            Ok(Self(value))
        } else {
            Err(ViewerError::validation(format!(
                "page_size must be one of 10, 50, 100 (got {})",
                value
            )))
        }
    }
}

/// The slice of a collection selected for one page, before fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_number: u64,
    pub page_size: PageSize,
    pub total_items: u64,
    pub total_pages: u64,
    pub offset: u64,
}

impl PageWindow {
    /// Maximum number of items to fetch for this window.
    pub fn limit(&self) -> u64 {
        u64::from(self.page_size.get())
    }

    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }

    /// Package fetched items together with the navigation metadata.
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        let (start_index, end_index) = if items.is_empty() {
            (0, 0)
        } else {
            (self.offset + 1, self.offset + items.len() as u64)
        };
        Page {
            page_number: self.page_number,
            page_size: self.page_size.get(),
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.has_previous(),
            has_next: self.has_next(),
            start_index,
            end_index,
            items,
        }
    }
}

/// A bounded slice of a collection plus navigation metadata.
///
/// `start_index`/`end_index` are 1-based and inclusive; both are `0` when
/// the page is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u64,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
    pub start_index: u64,
    pub end_index: u64,
}

impl<T> Page<T> {
    /// Transform the items while keeping the navigation metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page_number: self.page_number,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
            has_previous: self.has_previous,
            has_next: self.has_next,
            start_index: self.start_index,
            end_index: self.end_index,
        }
    }
}

/// Compute the page window for `requested_page` over `total_items`.
///
/// # Errors
///
/// Returns [`ViewerError::Validation`] when `page_size` is not one of
/// [`ALLOWED_PAGE_SIZES`]. Any `requested_page`, including zero and
/// negative values, is accepted and clamped.
pub fn paginate(
    total_items: u64,
    requested_page: i64,
    page_size: u32,
) -> Result<PageWindow, ViewerError> {
    let page_size = PageSize::try_from(page_size)?;
    let size = u64::from(page_size.get());

    let total_pages = if total_items == 0 {
        0
    } else {
        total_items.div_ceil(size)
    };

    let last_page = total_pages.max(1);
    let page_number = if requested_page < 1 {
        1
    } else {
        (requested_page as u64).min(last_page)
    };

    Ok(PageWindow {
        page_number,
        page_size,
        total_items,
        total_pages,
        offset: (page_number - 1) * size,
    })
}
