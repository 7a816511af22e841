//! Page-number pagination
//!
//! Query parameter handling and the response envelope shared by the
//! paginated list endpoints.

use serde::{Deserialize, Serialize};

/// Page size for product listings
pub const PRODUCT_PAGE_SIZE: u32 = 5;

/// Page size for cart item listings
pub const CART_ITEM_PAGE_SIZE: u32 = 10;

/// Query parameters accepted by paginated list endpoints
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    /// 1-based page number; defaults to the first page
    pub page: Option<u32>,
    /// Case-insensitive substring match on the name field
    pub search: Option<String>,
}

impl PageQuery {
    /// Resolve the 1-based page number (minimum 1).
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    /// Row offset for the given page size.
    ///
    /// Widened before multiplying so an arbitrary client-supplied page
    /// number cannot overflow.
    pub fn offset(&self, page_size: u32) -> i64 {
        (i64::from(self.page()) - 1) * i64::from(page_size)
    }
}

/// Paginated response envelope
#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    /// Total number of matching rows (across all pages)
    pub count: i64,
    /// Current 1-based page
    pub page: u32,
    /// Maximum rows per page
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    pub fn new(count: i64, page: u32, page_size: u32, results: Vec<T>) -> Self {
        Self {
            count,
            page,
            page_size,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_defaults_to_one() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.offset(5), 0);
    }

    #[test]
    fn offset_scales_with_page_size() {
        let q = PageQuery {
            page: Some(3),
            search: None,
        };
        assert_eq!(q.offset(5), 10);
        assert_eq!(q.offset(10), 20);
    }

    #[test]
    fn zero_page_is_clamped() {
        let q = PageQuery {
            page: Some(0),
            search: None,
        };
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let q = PageQuery {
            page: Some(u32::MAX),
            search: None,
        };
        assert_eq!(
            q.offset(PRODUCT_PAGE_SIZE),
            (i64::from(u32::MAX) - 1) * i64::from(PRODUCT_PAGE_SIZE)
        );
        assert_eq!(
            q.offset(CART_ITEM_PAGE_SIZE),
            (i64::from(u32::MAX) - 1) * i64::from(CART_ITEM_PAGE_SIZE)
        );
    }
}
