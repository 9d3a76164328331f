use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageButton {
    Page { number: usize, current: bool },
    Ellipsis,
}

/// Number of pages needed for `total` rows; never less than one.
pub fn page_count(total: usize, rows_per_page: usize) -> usize {
    let rows = rows_per_page.max(1);
    total.div_ceil(rows).max(1)
}

/// Index range of page `page` (1-based), clipped to `total`.
pub fn page_range(total: usize, page: usize, rows_per_page: usize) -> Range<usize> {
    let rows = rows_per_page.max(1);
    let start = (page.max(1) - 1).saturating_mul(rows).min(total);
    let end = start.saturating_add(rows).min(total);
    start..end
}

/// Up to `width` numbered buttons centred on `current`, plus first/last
/// buttons and ellipses when the window does not reach either edge.
pub fn page_buttons(current: usize, total_pages: usize, width: usize) -> Vec<PageButton> {
    let total = total_pages.max(1);
    let width = width.max(1);
    let current = current.clamp(1, total);

    let mut start = current.saturating_sub(width / 2).max(1);
    let end = (start + width - 1).min(total);
    start = (end + 1).saturating_sub(width).max(1);

    let page = |number: usize| PageButton::Page {
        number,
        current: number == current,
    };
    let mut buttons = Vec::new();
    if start > 1 {
        buttons.push(page(1));
        if start > 2 {
            buttons.push(PageButton::Ellipsis);
        }
    }
    buttons.extend((start..=end).map(page));
    if end < total {
        if end + 1 < total {
            buttons.push(PageButton::Ellipsis);
        }
        buttons.push(page(total));
    }
    buttons
}

/// Render buttons as `1 … 4 5 [6] 7 8 … 20`.
pub fn format_buttons(buttons: &[PageButton]) -> String {
    buttons
        .iter()
        .map(|b| match b {
            PageButton::Page { number, current: true } => format!("[{number}]"),
            PageButton::Page { number, .. } => number.to_string(),
            PageButton::Ellipsis => "\u{2026}".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(5, 0), 5);
    }

    #[test]
    fn test_pages_reconstruct_input() {
        let items: Vec<usize> = (0..47).collect();
        for rows in 1..=50 {
            let mut rebuilt = Vec::new();
            for page in 1..=page_count(items.len(), rows) {
                rebuilt.extend_from_slice(&items[page_range(items.len(), page, rows)]);
            }
            assert_eq!(rebuilt, items, "rows_per_page = {rows}");
        }
    }

    #[test]
    fn test_page_range_past_end_is_empty() {
        assert_eq!(page_range(5, 3, 10), 5..5);
        assert_eq!(page_range(25, 3, 10), 20..25);
    }

    #[test]
    fn test_buttons_small_total_has_no_ellipsis() {
        let buttons = page_buttons(2, 3, 5);
        assert_eq!(format_buttons(&buttons), "1 [2] 3");
    }

    #[test]
    fn test_buttons_centred_with_edges() {
        assert_eq!(format_buttons(&page_buttons(10, 20, 5)), "1 \u{2026} 8 9 [10] 11 12 \u{2026} 20");
    }

    #[test]
    fn test_buttons_at_start_and_end() {
        assert_eq!(format_buttons(&page_buttons(1, 20, 5)), "[1] 2 3 4 5 \u{2026} 20");
        assert_eq!(format_buttons(&page_buttons(20, 20, 5)), "1 \u{2026} 16 17 18 19 [20]");
    }

    #[test]
    fn test_buttons_adjacent_edge_has_no_ellipsis() {
        assert_eq!(format_buttons(&page_buttons(4, 7, 5)), "1 2 3 [4] 5 6 7");
        assert_eq!(format_buttons(&page_buttons(5, 8, 5)), "1 \u{2026} 3 4 [5] 6 7 8");
    }
}
