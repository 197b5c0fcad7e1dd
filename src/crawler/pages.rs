//! Page arithmetic for paged listings

/// Returns the number of pages needed to list `item_count` items
///
/// Any remainder needs one more page. A zero `page_size` yields zero pages.
///
/// # Example
///
/// ```
/// use flickr_harvest::crawler::pages_needed;
///
/// assert_eq!(pages_needed(1200, 500), 3);
/// assert_eq!(pages_needed(500, 500), 1);
/// ```
pub fn pages_needed(item_count: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }

    let page_size = u64::from(page_size);
    let full = item_count / page_size;
    let spare = u64::from(item_count % page_size != 0);

    u32::try_from(full + spare).unwrap_or(u32::MAX)
}
