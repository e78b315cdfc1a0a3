//! Pagination utilities for service layer
//!
//! Page numbers are 1-based and echoed back to the caller unchanged.
//! Skip and limit must fit a signed 64-bit SQL `OFFSET`/`LIMIT`.

use crate::errors::ServiceError;

const MAX_SQL_BOUND: u64 = i64::MAX as u64;

/// Pagination parameters
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page index
    pub page: u64,
    /// items per page
    pub per_page: u64,
}

impl Pagination {
    pub const DEFAULT_PER_PAGE: u64 = 50;

    pub fn new(page: Option<u64>, per_page: Option<u64>) -> Self {
        let d = Self::default();
        Self { page: page.unwrap_or(d.page), per_page: per_page.unwrap_or(d.per_page) }
    }

    /// Validate and convert to `(skip, limit)`.
    pub fn bounds(self) -> Result<(u64, u64), ServiceError> {
        if self.page == 0 {
            return Err(ServiceError::invalid("page must be >= 1"));
        }
        if self.per_page == 0 {
            return Err(ServiceError::invalid("limit must be >= 1"));
        }
        if self.per_page > MAX_SQL_BOUND {
            return Err(ServiceError::invalid("limit is out of range"));
        }
        let skip = (self.page - 1)
            .checked_mul(self.per_page)
            .filter(|skip| *skip <= MAX_SQL_BOUND)
            .ok_or_else(|| ServiceError::invalid("page is out of range"))?;
        Ok((skip, self.per_page))
    }

    /// `ceil(total / per_page)`; zero when nothing matches.
    pub fn total_pages(self, total: u64) -> u64 {
        if self.per_page == 0 { 0 } else { total.div_ceil(self.per_page) }
    }
}

impl Default for Pagination {
    fn default() -> Self { Self { page: 1, per_page: Self::DEFAULT_PER_PAGE } }
}
