//! Pagination arithmetic for track pages

/// Pagination metadata calculated from the total count and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// Current page number (1-indexed)
    pub page: u32,
    /// Total number of pages (0 when there are no results)
    pub total_pages: u32,
    /// Whether a following page exists
    pub has_next: bool,
    /// Whether a preceding page exists
    pub has_prev: bool,
}

/// Number of pages needed for `total` items at `limit` per page
pub fn total_pages(total: u64, limit: u32) -> u32 {
    let limit = u64::from(limit.max(1));
    total.div_ceil(limit).min(u64::from(u32::MAX)) as u32
}

/// Calculate pagination metadata for `requested_page`
///
/// The page is clamped to `[1, max(1, total_pages)]`. "Next" is only
/// available while `page * limit < total`.
///
/// # Examples
/// ```
/// use trackshelf_common::pagination::calculate_pagination;
///
/// // 25 tracks at 10 per page = 3 pages
/// let p = calculate_pagination(25, 10, 2);
/// assert_eq!(p.page, 2);
/// assert_eq!(p.total_pages, 3);
/// assert!(p.has_next);
///
/// // Requesting out-of-bounds page gets clamped
/// let p = calculate_pagination(25, 10, 99);
/// assert_eq!(p.page, 3);
/// assert!(!p.has_next);
/// ```
pub fn calculate_pagination(total: u64, limit: u32, requested_page: u32) -> Pagination {
    let total_pages = total_pages(total, limit);
    let page = requested_page.max(1).min(total_pages.max(1));

    Pagination {
        page,
        total_pages,
        has_next: u64::from(page) * u64::from(limit.max(1)) < total,
        has_prev: page > 1,
    }
}
