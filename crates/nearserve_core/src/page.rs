//! crates/nearserve_core/src/page.rs
//!
//! Pagination bookkeeping returned alongside every list endpoint.

use serde::Serialize;

/// Pagination metadata for a list response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let limit = limit.max(1);
        Self {
            total,
            page: page.max(1),
            pages: (total + limit - 1) / limit,
            limit,
        }
    }

    /// Row offset for the query backing this page.
    pub fn offset(page: i64, limit: i64) -> i64 {
        (page.max(1) - 1) * limit.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up() {
        assert_eq!(Page::new(0, 1, 10).pages, 0);
        assert_eq!(Page::new(10, 1, 10).pages, 1);
        assert_eq!(Page::new(11, 1, 10).pages, 2);
        assert_eq!(Page::new(25, 3, 10).pages, 3);
    }

    #[test]
    fn offset_is_zero_based() {
        assert_eq!(Page::offset(1, 10), 0);
        assert_eq!(Page::offset(3, 10), 20);
        // Nonsense page numbers clamp instead of underflowing.
        assert_eq!(Page::offset(0, 10), 0);
    }
}
