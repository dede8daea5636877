//! Product catalog tests
//!
//! Covers slug generation, stock status buckets, pagination and the
//! bulk-operation result shape.

use proptest::prelude::*;
use shared::models::StockStatus;
use shared::types::{BulkItemOutcome, BulkSummary, PageQuery, Pagination, PaginationMeta};
use shared::validation::slugify;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_slug_basic() {
        assert_eq!(slugify("Brake Pad Set"), "brake-pad-set");
        assert_eq!(slugify("Oil Filter  XL"), "oil-filter-xl");
    }

    #[test]
    fn test_slug_strips_punctuation() {
        assert_eq!(slugify("Spark Plug (Iridium)"), "spark-plug-iridium");
        assert_eq!(slugify("5W-30 / 1L"), "5w-30-1l");
    }

    #[test]
    fn test_slug_never_has_leading_or_trailing_dash() {
        for name in ["  padded  ", "!!bang!!", "-already-dashed-"] {
            let slug = slugify(name);
            assert!(!slug.starts_with('-'), "slug {:?} from {:?}", slug, name);
            assert!(!slug.ends_with('-'), "slug {:?} from {:?}", slug, name);
        }
    }

    #[test]
    fn test_stock_buckets() {
        assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(5, 5), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(50, 5), StockStatus::Normal);
    }

    /// Boundary: a product exactly at min_stock counts as low
    #[test]
    fn test_stock_bucket_boundaries() {
        assert_eq!(StockStatus::classify(1, 0), StockStatus::Normal);
        assert_eq!(StockStatus::classify(1, 1), StockStatus::LowStock);
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
    }

    /// Page is at least 1, limit clamped into [10, 100]
    #[test]
    fn test_pagination_clamping() {
        let p = PageQuery {
            page: Some(0),
            limit: Some(1),
        }
        .clamp();
        assert_eq!((p.page, p.limit), (1, 10));

        let p = PageQuery {
            page: None,
            limit: None,
        }
        .clamp();
        assert_eq!((p.page, p.limit), (1, 20));

        let p = PageQuery {
            page: Some(7),
            limit: Some(1000),
        }
        .clamp();
        assert_eq!((p.page, p.limit), (7, 100));
    }

    #[test]
    fn test_pagination_links() {
        let meta = PaginationMeta::new(Pagination { page: 2, limit: 10 }, 35);
        assert_eq!(meta.total_pages, 4);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let meta = PaginationMeta::new(Pagination { page: 4, limit: 10 }, 35);
        assert!(!meta.has_next);
    }

    #[test]
    fn test_bulk_summary_mixed_outcomes() {
        let summary = BulkSummary::from_results(vec![
            BulkItemOutcome::ok(1),
            BulkItemOutcome::failed(2, "Product not found"),
            BulkItemOutcome::ok(3),
            BulkItemOutcome::failed(4, "Product is already inactive"),
        ]);
        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 2);
        // Input order is preserved
        let ids: Vec<i64> = summary.results.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Slugs only ever contain lowercase alphanumerics and dashes
        #[test]
        fn prop_slug_alphabet(name in ".{0,64}") {
            let slug = slugify(&name);
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'));
            prop_assert!(!slug.contains("--"));
        }

        /// Slugging is idempotent
        #[test]
        fn prop_slug_idempotent(name in "[a-zA-Z0-9 ]{1,40}") {
            let once = slugify(&name);
            prop_assert_eq!(slugify(&once), once.clone());
        }

        /// Exactly one bucket matches any stock level
        #[test]
        fn prop_stock_bucket_total(stock in -10i32..1_000, min_stock in 0i32..500) {
            let bucket = StockStatus::classify(stock, min_stock);
            let expected = if stock <= 0 {
                StockStatus::OutOfStock
            } else if stock <= min_stock {
                StockStatus::LowStock
            } else {
                StockStatus::Normal
            };
            prop_assert_eq!(bucket, expected);
        }

        /// Pagination math: offset and page count line up
        #[test]
        fn prop_pagination_offsets(page in 1u32..100, limit in 10u32..=100, total in 0u64..10_000) {
            let pagination = Pagination { page, limit };
            prop_assert_eq!(pagination.offset(), (page - 1) * limit);

            let meta = PaginationMeta::new(pagination, total);
            let expected_pages = (total + limit as u64 - 1) / limit as u64;
            prop_assert_eq!(meta.total_pages as u64, expected_pages);
            prop_assert_eq!(meta.has_next, (page as u64) < expected_pages);
        }

        /// Bulk summaries always balance
        #[test]
        fn prop_bulk_summary_balances(outcomes in prop::collection::vec(any::<bool>(), 0..50)) {
            let results: Vec<BulkItemOutcome> = outcomes
                .iter()
                .enumerate()
                .map(|(i, ok)| {
                    if *ok {
                        BulkItemOutcome::ok(i as i64)
                    } else {
                        BulkItemOutcome::failed(i as i64, "error")
                    }
                })
                .collect();
            let summary = BulkSummary::from_results(results);
            prop_assert_eq!(summary.succeeded + summary.failed, summary.total);
            prop_assert_eq!(summary.total, outcomes.len());
        }
    }
}
