//! Page requests for list queries
//!
//! Pages are zero-based. Any page past the end of the data is simply empty;
//! nothing is clamped and nothing errors.

use serde::{Deserialize, Serialize};

/// Default page size when a caller asks for a page without a size
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page number
    pub page_number: u32,
    /// Rows per page (0 yields an empty page)
    pub page_size: u32,
}

impl PageRequest {
    pub fn of(page_number: u32, page_size: u32) -> Self {
        PageRequest {
            page_number,
            page_size,
        }
    }

    /// SQL LIMIT value
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// SQL OFFSET value; saturates instead of overflowing
    pub fn offset(&self) -> i64 {
        i64::from(self.page_number).saturating_mul(i64::from(self.page_size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        PageRequest::of(0, DEFAULT_PAGE_SIZE)
    }
}
