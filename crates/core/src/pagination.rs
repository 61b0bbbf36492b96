//! Page/limit handling shared by every listing endpoint.

use serde::{Deserialize, Serialize};

/// Upper bound on `limit` to keep listing queries bounded.
pub const MAX_LIMIT: u32 = 100;

/// A parsed `page`/`limit` pair (both 1-based and at least 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Parse raw query-string values, falling back to page 1 and
    /// `default_limit` when a value is absent or not a positive integer.
    ///
    /// ```
    /// use bazaar_core::PageRequest;
    ///
    /// let req = PageRequest::parse(Some("3"), Some("abc"), 12);
    /// assert_eq!((req.page, req.limit), (3, 12));
    /// ```
    #[must_use]
    pub fn parse(page: Option<&str>, limit: Option<&str>, default_limit: u32) -> Self {
        let page = parse_positive(page).unwrap_or(1);
        let limit = parse_positive(limit)
            .unwrap_or(default_limit)
            .clamp(1, MAX_LIMIT);
        Self { page, limit }
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page as i64 - 1) * self.limit as i64
    }
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|n| *n >= 1)
}

/// Pagination block returned alongside list payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    /// Build the block for a request that matched `total` rows in all.
    #[must_use]
    pub fn new(request: PageRequest, total: i64) -> Self {
        let total = total.max(0);
        let limit = i64::from(request.limit.max(1));
        Self {
            page: request.page,
            limit: request.limit,
            total,
            pages: (total + limit - 1) / limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_missing() {
        let req = PageRequest::parse(None, None, 10);
        assert_eq!(req, PageRequest { page: 1, limit: 10 });
        assert_eq!(req.offset(), 0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let req = PageRequest::parse(Some("0"), Some("-5"), 8);
        assert_eq!(req, PageRequest { page: 1, limit: 8 });
    }

    #[test]
    fn test_limit_is_capped() {
        let req = PageRequest::parse(Some("2"), Some("5000"), 10);
        assert_eq!(req.limit, MAX_LIMIT);
        assert_eq!(req.offset(), i64::from(MAX_LIMIT));
    }

    #[test]
    fn test_page_count_rounds_up() {
        let req = PageRequest::parse(Some("1"), Some("10"), 10);
        assert_eq!(Pagination::new(req, 25).pages, 3);
        assert_eq!(Pagination::new(req, 30).pages, 3);
        assert_eq!(Pagination::new(req, 0).pages, 0);
    }

    #[test]
    fn test_offset_for_later_pages() {
        let req = PageRequest::parse(Some("3"), Some("12"), 10);
        assert_eq!(req.offset(), 24);
    }
}
