//! Reporting service for sales analytics
//!
//! Read-only aggregate queries over a date range, recomputed per request.
//! Only completed sales count toward revenue figures.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;

use crate::error::AppResult;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: MySqlPool,
}

/// Report filter parameters
#[derive(Debug, Default, Deserialize)]
pub struct ReportFilter {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

impl ReportFilter {
    fn range(&self) -> (NaiveDate, NaiveDate) {
        (
            self.date_from
                .unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()),
            self.date_to
                .unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap()),
        )
    }
}

/// Overall sales summary
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SalesSummary {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub total_tax: Decimal,
    pub total_discount: Decimal,
    pub average_sale: Option<Decimal>,
    pub unique_customers: i64,
}

/// Revenue and units grouped by product
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductReportRow {
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_sku: String,
    pub units_sold: Decimal,
    pub revenue: Decimal,
}

/// Revenue and order count grouped by customer
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct CustomerReportRow {
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub orders: i64,
    pub revenue: Decimal,
}

/// Per-day totals
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyReportRow {
    pub day: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

impl ReportingService {
    pub fn new(db: MySqlPool) -> Self {
        Self { db }
    }

    /// Totals, averages and customer reach over the range
    pub async fn summary(&self, filter: &ReportFilter) -> AppResult<SalesSummary> {
        let (from, to) = filter.range();

        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT COUNT(*) AS total_sales,
                   COALESCE(SUM(total), 0) AS total_revenue,
                   COALESCE(SUM(tax_amount), 0) AS total_tax,
                   COALESCE(SUM(discount_amount), 0) AS total_discount,
                   AVG(total) AS average_sale,
                   COUNT(DISTINCT customer_id) AS unique_customers
            FROM sales
            WHERE sale_status = 'completed'
              AND DATE(sale_date) BETWEEN ? AND ?
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.db)
        .await?;

        Ok(summary)
    }

    /// Revenue and units by product, best sellers first
    pub async fn by_product(&self, filter: &ReportFilter) -> AppResult<Vec<ProductReportRow>> {
        let (from, to) = filter.range();

        let rows = sqlx::query_as::<_, ProductReportRow>(
            r#"
            SELECT si.product_id,
                   si.product_name,
                   si.product_sku,
                   COALESCE(SUM(si.quantity), 0) AS units_sold,
                   COALESCE(SUM(si.subtotal), 0) AS revenue
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.sale_status = 'completed'
              AND DATE(s.sale_date) BETWEEN ? AND ?
            GROUP BY si.product_id, si.product_name, si.product_sku
            ORDER BY revenue DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Revenue and order count by customer, biggest spenders first
    pub async fn by_customer(&self, filter: &ReportFilter) -> AppResult<Vec<CustomerReportRow>> {
        let (from, to) = filter.range();

        let rows = sqlx::query_as::<_, CustomerReportRow>(
            r#"
            SELECT customer_id,
                   customer_name,
                   COUNT(*) AS orders,
                   COALESCE(SUM(total), 0) AS revenue
            FROM sales
            WHERE sale_status = 'completed'
              AND DATE(sale_date) BETWEEN ? AND ?
            GROUP BY customer_id, customer_name
            ORDER BY revenue DESC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Per-day totals, oldest first
    pub async fn daily(&self, filter: &ReportFilter) -> AppResult<Vec<DailyReportRow>> {
        let (from, to) = filter.range();

        let rows = sqlx::query_as::<_, DailyReportRow>(
            r#"
            SELECT DATE(sale_date) AS day,
                   COUNT(*) AS orders,
                   COALESCE(SUM(total), 0) AS revenue
            FROM sales
            WHERE sale_status = 'completed'
              AND DATE(sale_date) BETWEEN ? AND ?
            GROUP BY DATE(sale_date)
            ORDER BY day ASC
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }
}
