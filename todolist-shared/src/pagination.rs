/// Page resolution for list endpoints
///
/// Page numbers are 1-based. Missing values fall back to page 1 and the
/// configured default size. Requested sizes above the configured maximum are
/// clamped to it; zero is rejected.

use serde::{Deserialize, Serialize};

/// Error type for page parameters
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PaginationError {
    #[error("pageNumber must be at least 1")]
    InvalidPageNumber,

    #[error("itemsPerPage must be at least 1")]
    InvalidPageSize,
}

impl PaginationError {
    /// Name of the offending query parameter
    pub fn field(&self) -> &'static str {
        match self {
            PaginationError::InvalidPageNumber => "pageNumber",
            PaginationError::InvalidPageSize => "itemsPerPage",
        }
    }
}

/// Process-wide pagination defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationConfig {
    /// Size used when the request does not name one
    pub default_page_size: u32,

    /// Hard upper bound on any requested size
    pub max_page_size: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Raw page parameters as supplied by a caller
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<u32>,
    pub items_per_page: Option<u32>,
}

impl PageQuery {
    pub fn new(page_number: u32, items_per_page: u32) -> Self {
        Self {
            page_number: Some(page_number),
            items_per_page: Some(items_per_page),
        }
    }
}

/// A validated, bounded page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page_number: u32,
    pub items_per_page: u32,
}

impl PageRequest {
    /// Rows to skip; saturates for page numbers far past any real data
    pub fn offset(&self) -> i64 {
        (i64::from(self.page_number) - 1).saturating_mul(i64::from(self.items_per_page))
    }

    /// Rows to take
    pub fn limit(&self) -> i64 {
        i64::from(self.items_per_page)
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub items_per_page: u32,
}

impl PaginationConfig {
    /// Resolves caller parameters against the defaults and the cap
    pub fn resolve(&self, query: PageQuery) -> Result<PageRequest, PaginationError> {
        let page_number = query.page_number.unwrap_or(1);
        if page_number == 0 {
            return Err(PaginationError::InvalidPageNumber);
        }

        let requested = query.items_per_page.unwrap_or(self.default_page_size);
        if requested == 0 {
            return Err(PaginationError::InvalidPageSize);
        }

        let items_per_page = requested.min(self.max_page_size);
        if items_per_page < requested {
            tracing::debug!(requested, capped = items_per_page, "Clamped page size");
        }

        Ok(PageRequest {
            page_number,
            items_per_page,
        })
    }
}
