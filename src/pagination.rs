//! This modules defines the common functionality for paging data.

use serde::Serialize;

use crate::Error;

/// The config for pagination
#[derive(Debug, Clone)]
pub struct PaginationConfig {
    /// The number of items per page when not specified in a request.
    pub default_limit: u32,
    /// The largest number of items a client may request per page.
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    /// Resolve the limit and offset requested by a client.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] if `limit` is zero or larger than [PaginationConfig::max_limit].
    pub fn resolve(&self, limit: Option<u32>, offset: Option<u32>) -> Result<PageRequest, Error> {
        let limit = limit.unwrap_or(self.default_limit);

        if limit == 0 || limit > self.max_limit {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}",
                self.max_limit
            )));
        }

        Ok(PageRequest {
            limit,
            offset: offset.unwrap_or(0),
        })
    }
}

/// A validated window into a list of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// The maximum number of items to return.
    pub limit: u32,
    /// The number of items to skip.
    pub offset: u32,
}

/// Describes where a page sits within the full list of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The number of items matching the query across all pages.
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    /// Whether there are items after this page.
    pub has_more: bool,
}

impl Pagination {
    /// Describe the page selected by `request` out of `total` items.
    pub fn new(request: PageRequest, total: u64) -> Self {
        Self {
            total,
            limit: request.limit,
            offset: request.offset,
            has_more: u64::from(request.offset) + u64::from(request.limit) < total,
        }
    }
}

/// A page of items with its pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}
