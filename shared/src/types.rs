//! Common types used across the platform

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Pagination parameters as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Clamp raw query parameters into valid pagination
    /// (page >= 1, 10 <= limit <= 100)
    pub fn clamp(&self) -> Pagination {
        let page = self.page.unwrap_or(1).max(1);
        let limit = self.limit.unwrap_or(20).clamp(10, 100);
        Pagination { page, limit }
    }
}

/// Validated pagination parameters
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

impl Pagination {
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata returned alongside list responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: Pagination, total: u64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            ((total + pagination.limit as u64 - 1) / pagination.limit as u64) as u32
        };
        Self {
            current_page: pagination.page,
            per_page: pagination.limit,
            total,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1 && total_pages > 0,
        }
    }
}

/// Paginated response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, pagination: Pagination, total: u64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(pagination, total),
        }
    }
}

/// Standard success envelope for API responses
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Outcome of one item within a bulk operation
#[derive(Debug, Clone, Serialize)]
pub struct BulkItemOutcome {
    pub id: i64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BulkItemOutcome {
    pub fn ok(id: i64) -> Self {
        Self {
            id,
            success: true,
            error: None,
        }
    }

    pub fn failed(id: i64, error: impl Into<String>) -> Self {
        Self {
            id,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Summary of a bulk operation: successes commit, failures are reported
#[derive(Debug, Clone, Serialize)]
pub struct BulkSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<BulkItemOutcome>,
}

impl BulkSummary {
    pub fn from_results(results: Vec<BulkItemOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_clamps_to_valid_range() {
        let q = PageQuery {
            page: Some(0),
            limit: Some(5),
        };
        let p = q.clamp();
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 10);

        let q = PageQuery {
            page: Some(3),
            limit: Some(500),
        };
        let p = q.clamp();
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 100);
    }

    #[test]
    fn pagination_meta_flags() {
        let meta = PaginationMeta::new(Pagination { page: 1, limit: 10 }, 25);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(!meta.has_prev);

        let meta = PaginationMeta::new(Pagination { page: 3, limit: 10 }, 25);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn pagination_meta_empty() {
        let meta = PaginationMeta::new(Pagination::default(), 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn bulk_summary_counts() {
        let summary = BulkSummary::from_results(vec![
            BulkItemOutcome::ok(1),
            BulkItemOutcome::failed(2, "insufficient stock"),
            BulkItemOutcome::ok(3),
        ]);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
    }
}
