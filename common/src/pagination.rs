//! ページ計算
//!
//! ページ番号は1始まり。範囲外のページは要求しない。

/// 詳細テーブルのページサイズ（固定）
pub const PAGE_SIZE: u32 = 100;

/// ページボタンの要素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Ellipsis,
}

pub fn total_pages(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(page_size as u64) as u32
}

/// ページが要求可能か
pub fn is_valid_page(page: u32, total: u64, page_size: u32) -> bool {
    page >= 1 && (page == 1 || page <= total_pages(total, page_size))
}

pub fn can_prev(page: u32) -> bool {
    page > 1
}

pub fn can_next(page: u32, total: u64, page_size: u32) -> bool {
    page < total_pages(total, page_size)
}

/// 指定ページに表示される行番号の範囲（1始まり、両端含む）
pub fn row_range(page: u32, total: u64, page_size: u32) -> Option<(u64, u64)> {
    if page == 0 || total == 0 {
        return None;
    }
    let start = (page as u64 - 1) * page_size as u64 + 1;
    if start > total {
        return None;
    }
    let end = (page as u64 * page_size as u64).min(total);
    Some((start, end))
}

/// ページボタンの並び
///
/// 7ページ以下は全ページ、それ以上は `1 … p-1 p p+1 … N`。
/// 1ページ以下ならナビゲーション自体を出さない（空）。
pub fn page_items(page: u32, total_pages: u32) -> Vec<PageItem> {
    if total_pages <= 1 {
        return Vec::new();
    }

    if total_pages <= 7 {
        return (1..=total_pages).map(PageItem::Page).collect();
    }

    let mut items = vec![PageItem::Page(1)];
    if page > 3 {
        items.push(PageItem::Ellipsis);
    }
    let from = page.saturating_sub(1).max(2);
    let to = (page + 1).min(total_pages - 1);
    for p in from..=to {
        items.push(PageItem::Page(p));
    }
    if page + 2 < total_pages {
        items.push(PageItem::Ellipsis);
    }
    items.push(PageItem::Page(total_pages));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use PageItem::{Ellipsis, Page};

    #[test]
    fn test_page_two_of_250() {
        assert_eq!(total_pages(250, PAGE_SIZE), 3);
        assert_eq!(row_range(2, 250, PAGE_SIZE), Some((101, 200)));
        assert_eq!(row_range(3, 250, PAGE_SIZE), Some((201, 250)));
        assert_eq!(row_range(4, 250, PAGE_SIZE), None);
    }

    #[test]
    fn test_bounds() {
        assert!(!can_prev(1));
        assert!(can_prev(2));
        assert!(can_next(2, 250, PAGE_SIZE));
        assert!(!can_next(3, 250, PAGE_SIZE));
        assert!(is_valid_page(1, 0, PAGE_SIZE));
        assert!(!is_valid_page(0, 250, PAGE_SIZE));
        assert!(!is_valid_page(4, 250, PAGE_SIZE));
    }

    #[test]
    fn test_page_items_small() {
        assert!(page_items(1, 1).is_empty());
        assert_eq!(page_items(2, 3), vec![Page(1), Page(2), Page(3)]);
    }

    #[test]
    fn test_page_items_window() {
        assert_eq!(
            page_items(1, 10),
            vec![Page(1), Page(2), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_items(5, 10),
            vec![Page(1), Ellipsis, Page(4), Page(5), Page(6), Ellipsis, Page(10)]
        );
        assert_eq!(
            page_items(10, 10),
            vec![Page(1), Ellipsis, Page(9), Page(10)]
        );
        assert_eq!(
            page_items(8, 10),
            vec![Page(1), Ellipsis, Page(7), Page(8), Page(9), Page(10)]
        );
    }
}
