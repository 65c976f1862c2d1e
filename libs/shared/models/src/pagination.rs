use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;

/// `?page=&limit=` query parameters. Pages are zero-based.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Pagination {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl Pagination {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> u64 {
        self.page.unwrap_or(0)
    }

    /// Requested page size, clamped to `MAX_PAGE_SIZE`. Returns `None` for zero.
    pub fn page_size(&self) -> Option<u64> {
        match self.limit {
            None => Some(DEFAULT_PAGE_SIZE),
            Some(0) => None,
            Some(limit) => Some(limit.min(MAX_PAGE_SIZE)),
        }
    }

    pub fn skip(&self, page_size: u64) -> u64 {
        self.page().saturating_mul(page_size)
    }
}
