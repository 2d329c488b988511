use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// Normalized page request: `page >= 1`, `1 <= page_size <= 100`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PaginationParams {
    page: u64,
    page_size: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PaginationParams {
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = match page {
            Some(p) if p >= 1 => p as u64,
            _ => 1,
        };
        let page_size = match page_size {
            Some(s) if s < 1 => DEFAULT_PAGE_SIZE,
            Some(s) if s as u64 > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(s) => s as u64,
            None => DEFAULT_PAGE_SIZE,
        };
        Self { page, page_size }
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, page: u64, page_size: u64, total_count: u64) -> Self {
        let total_pages = total_pages(total_count, page_size);
        Self {
            items,
            page,
            page_size,
            total_count,
            total_pages,
            has_next: page < total_pages,
            has_previous: page > 1,
        }
    }

    pub fn from_params(items: Vec<T>, params: PaginationParams, total_count: u64) -> Self {
        Self::new(items, params.page(), params.page_size(), total_count)
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_count: self.total_count,
            total_pages: self.total_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

pub fn total_pages(total_count: u64, page_size: u64) -> u64 {
    if page_size == 0 {
        0
    } else {
        total_count.div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_clamp_out_of_range_values() {
        let p = PaginationParams::new(Some(0), Some(0));
        assert_eq!((p.page(), p.page_size()), (1, DEFAULT_PAGE_SIZE));
        let p = PaginationParams::new(Some(-3), Some(500));
        assert_eq!((p.page(), p.page_size()), (1, MAX_PAGE_SIZE));
        let p = PaginationParams::new(Some(3), Some(25));
        assert_eq!((p.page(), p.page_size(), p.skip()), (3, 25, 50));
        assert_eq!(PaginationParams::default().skip(), 0);
    }

    #[test]
    fn total_pages_rounds_up() {
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn navigation_flags_follow_page_position() {
        let first = PagedResult::new(vec![1, 2], 1, 2, 5);
        assert_eq!(first.total_pages, 3);
        assert!(first.has_next);
        assert!(!first.has_previous);

        let last = PagedResult::new(vec![5], 3, 2, 5);
        assert!(!last.has_next);
        assert!(last.has_previous);

        let empty = PagedResult::<u8>::new(vec![], 1, 0, 10);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }

    #[test]
    fn map_keeps_counts() {
        let page = PagedResult::new(vec![1, 2, 3], 2, 3, 9).map(|n| n * 10);
        assert_eq!(page.items, vec![10, 20, 30]);
        assert_eq!(page.total_count, 9);
        assert!(page.has_previous);
    }
}
