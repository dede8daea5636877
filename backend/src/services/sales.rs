//! Sale creation and lifecycle service
//!
//! A sale and its items are created as one atomic unit. The stock
//! decrement is an explicit part of the same transaction, never a
//! database trigger: per item the product row is locked, stock is
//! re-checked, decremented, and one `out` movement is appended.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::models::{MovementType, PaymentMethod, PaymentStatus, SaleStatus};
use shared::types::{PageQuery, Paginated};
use shared::validation::{
    line_totals, sale_totals, validate_discount_percentage, validate_price, validate_quantity,
};
use sqlx::{MySql, MySqlPool, QueryBuilder, Transaction};

use crate::error::{AppError, AppResult, FieldError};
use crate::services::customers::CustomerService;
use crate::services::inventory::{InventoryService, NewMovement};

/// Sale service
#[derive(Clone)]
pub struct SaleService {
    db: MySqlPool,
    default_tax_rate: Decimal,
}

/// Sale record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Sale {
    pub id: i64,
    pub sale_number: String,
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub subtotal: Decimal,
    pub tax_rate: Decimal,
    pub tax_amount: Decimal,
    pub discount_amount: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub sale_status: String,
    pub notes: Option<String>,
    pub sold_by: Option<i64>,
    pub sale_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Sale line item; snapshots never change after creation
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub product_sku: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub unit_cost: Option<Decimal>,
    pub discount_percentage: Decimal,
    pub discount_amount: Decimal,
    pub subtotal: Decimal,
}

/// Sale with its line items
#[derive(Debug, Serialize)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// One requested line item
#[derive(Debug, Deserialize)]
pub struct SaleItemInput {
    pub product_id: i64,
    pub quantity: i32,
    /// Overrides the product's current price when given (manual discounting)
    pub unit_price: Option<Decimal>,
    pub discount_percentage: Option<Decimal>,
}

/// Input for creating a sale
#[derive(Debug, Deserialize)]
pub struct CreateSaleInput {
    pub customer_id: Option<i64>,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub items: Vec<SaleItemInput>,
    pub discount_amount: Option<Decimal>,
    pub tax_rate: Option<Decimal>,
    pub payment_method: String,
    pub notes: Option<String>,
}

/// Input for a status transition
#[derive(Debug, Deserialize)]
pub struct UpdateSaleStatusInput {
    pub sale_status: String,
}

/// Listing filters
#[derive(Debug, Default, Deserialize)]
pub struct SaleFilters {
    pub status: Option<String>,
    pub payment_method: Option<String>,
    pub customer_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

/// Aggregate sale statistics
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct SaleStats {
    pub total_sales: i64,
    pub total_revenue: Decimal,
    pub average_sale: Option<Decimal>,
    pub completed: i64,
    pub draft: i64,
    pub cancelled: i64,
    pub refunded: i64,
}

/// A line resolved against the catalog during creation
struct ResolvedLine {
    product_id: i64,
    product_name: String,
    product_sku: String,
    quantity: i32,
    unit_price: Decimal,
    unit_cost: Option<Decimal>,
    discount_percentage: Decimal,
    discount_amount: Decimal,
    subtotal: Decimal,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductSnapshot {
    id: i64,
    name: String,
    sku: String,
    price: Decimal,
    cost_price: Option<Decimal>,
    stock: i32,
    status: String,
}

impl SaleService {
    pub fn new(db: MySqlPool, default_tax_rate: Decimal) -> Self {
        Self {
            db,
            default_tax_rate,
        }
    }

    /// Create a sale (or a draft quote) as one transaction.
    ///
    /// Quotes persist the sale and items without touching stock or
    /// customer totals.
    pub async fn create(
        &self,
        input: CreateSaleInput,
        is_quote: bool,
        user_id: i64,
    ) -> AppResult<SaleWithItems> {
        // Top-level and per-item field validation; every failure reported
        let mut errors = Vec::new();

        if input.customer_name.trim().is_empty() {
            errors.push(FieldError::new("customer_name", "Customer name is required"));
        }
        if PaymentMethod::parse(&input.payment_method).is_none() {
            errors.push(FieldError::new(
                "payment_method",
                "Payment method must be one of: cash, card, transfer, credit",
            ));
        }
        if input.items.is_empty() {
            errors.push(FieldError::new("items", "At least one item is required"));
        }
        let discount_amount = input.discount_amount.unwrap_or(Decimal::ZERO);
        if discount_amount < Decimal::ZERO {
            errors.push(FieldError::new(
                "discount_amount",
                "Discount cannot be negative",
            ));
        }
        let tax_rate = input.tax_rate.unwrap_or(self.default_tax_rate);
        if tax_rate < Decimal::ZERO || tax_rate >= Decimal::ONE {
            errors.push(FieldError::new("tax_rate", "Tax rate must be within [0, 1)"));
        }

        for (idx, item) in input.items.iter().enumerate() {
            if let Err(msg) = validate_quantity(item.quantity) {
                errors.push(FieldError::new(format!("items[{idx}].quantity"), msg));
            }
            if let Some(pct) = item.discount_percentage {
                if let Err(msg) = validate_discount_percentage(pct) {
                    errors.push(FieldError::new(
                        format!("items[{idx}].discount_percentage"),
                        msg,
                    ));
                }
            }
            if let Some(price) = item.unit_price {
                if let Err(msg) = validate_price(price) {
                    errors.push(FieldError::new(format!("items[{idx}].unit_price"), msg));
                }
            }
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        let payment_method = PaymentMethod::parse(&input.payment_method).ok_or_else(|| {
            AppError::validation("payment_method", "Unknown payment method")
        })?;

        let mut tx = self.db.begin().await?;

        // First stock pass: resolve every product and accumulate item
        // errors so the whole cart is reported at once
        let mut lines = Vec::with_capacity(input.items.len());
        for (idx, item) in input.items.iter().enumerate() {
            let product = sqlx::query_as::<_, ProductSnapshot>(
                r#"
                SELECT id, name, sku, price, cost_price, stock, status
                FROM products
                WHERE id = ?
                "#,
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let product = match product {
                Some(p) => p,
                None => {
                    errors.push(FieldError::new(
                        format!("items[{idx}].product_id"),
                        "Product does not exist",
                    ));
                    continue;
                }
            };
            if product.status != "active" {
                errors.push(FieldError::new(
                    format!("items[{idx}].product_id"),
                    "Product is not active",
                ));
                continue;
            }
            if !is_quote && item.quantity > product.stock {
                errors.push(FieldError::new(
                    format!("items[{idx}].quantity"),
                    format!(
                        "Requested quantity ({}) exceeds available stock ({})",
                        item.quantity, product.stock
                    ),
                ));
                continue;
            }

            let unit_price = item.unit_price.unwrap_or(product.price);
            let discount_percentage = item.discount_percentage.unwrap_or(Decimal::ZERO);
            let totals = line_totals(unit_price, item.quantity, discount_percentage);

            lines.push(ResolvedLine {
                product_id: product.id,
                product_name: product.name,
                product_sku: product.sku,
                quantity: item.quantity,
                unit_price,
                unit_cost: product.cost_price,
                discount_percentage,
                discount_amount: totals.discount_amount,
                subtotal: totals.subtotal,
            });
        }

        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        let line_subtotals: Vec<Decimal> = lines.iter().map(|l| l.subtotal).collect();
        let totals = sale_totals(&line_subtotals, discount_amount, tax_rate);
        if discount_amount > totals.subtotal {
            return Err(AppError::validation(
                "discount_amount",
                "Discount cannot exceed the sale subtotal",
            ));
        }

        let sale_number = self.next_sale_number(&mut tx).await?;

        // Resolve or create the customer; an explicit id wins
        let customer_id = match input.customer_id {
            Some(id) => {
                let exists = sqlx::query_scalar::<_, i64>(
                    "SELECT COUNT(*) FROM customers WHERE id = ?",
                )
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
                if exists == 0 {
                    return Err(AppError::NotFound("Customer".to_string()));
                }
                Some(id)
            }
            None => {
                CustomerService::resolve_for_sale_tx(
                    &mut tx,
                    input.customer_name.trim(),
                    input.customer_email.as_deref(),
                    input.customer_phone.as_deref(),
                )
                .await?
            }
        };

        let sale_status = if is_quote {
            SaleStatus::Draft
        } else {
            SaleStatus::Completed
        };
        let payment_status = if is_quote {
            PaymentStatus::Pending
        } else {
            PaymentStatus::Paid
        };

        let result = sqlx::query(
            r#"
            INSERT INTO sales
                (sale_number, customer_id, customer_name, customer_phone, customer_email,
                 subtotal, tax_rate, tax_amount, discount_amount, total,
                 payment_method, payment_status, sale_status, notes, sold_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&sale_number)
        .bind(customer_id)
        .bind(input.customer_name.trim())
        .bind(&input.customer_phone)
        .bind(&input.customer_email)
        .bind(totals.subtotal)
        .bind(tax_rate)
        .bind(totals.tax_amount)
        .bind(discount_amount)
        .bind(totals.total)
        .bind(payment_method.as_str())
        .bind(payment_status.as_str())
        .bind(sale_status.as_str())
        .bind(&input.notes)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        let sale_id = result.last_insert_id() as i64;

        for line in &lines {
            if !is_quote {
                // Second stock pass, now locked: guards the gap between
                // validation and the write
                let stock = sqlx::query_scalar::<_, i32>(
                    "SELECT stock FROM products WHERE id = ? FOR UPDATE",
                )
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

                if line.quantity > stock {
                    return Err(AppError::Conflict {
                        message: "Stock changed while the sale was being created".to_string(),
                        details: Some(serde_json::json!({
                            "product_id": line.product_id,
                            "requested": line.quantity,
                            "available": stock,
                        })),
                    });
                }

                sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ?")
                    .bind(line.quantity)
                    .bind(line.product_id)
                    .execute(&mut *tx)
                    .await?;

                InventoryService::record_tx(
                    &mut tx,
                    NewMovement {
                        product_id: line.product_id,
                        movement_type: MovementType::Out,
                        quantity: line.quantity,
                        previous_stock: stock,
                        new_stock: stock - line.quantity,
                        unit_cost: line.unit_cost,
                        reference_type: Some("sale".to_string()),
                        reference_id: Some(sale_id),
                        notes: Some(sale_number.clone()),
                        created_by: Some(user_id),
                    },
                )
                .await?;
            }

            sqlx::query(
                r#"
                INSERT INTO sale_items
                    (sale_id, product_id, product_name, product_sku, quantity,
                     unit_price, unit_cost, discount_percentage, discount_amount, subtotal)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(sale_id)
            .bind(line.product_id)
            .bind(&line.product_name)
            .bind(&line.product_sku)
            .bind(line.quantity)
            .bind(line.unit_price)
            .bind(line.unit_cost)
            .bind(line.discount_percentage)
            .bind(line.discount_amount)
            .bind(line.subtotal)
            .execute(&mut *tx)
            .await?;
        }

        if !is_quote {
            if let Some(customer_id) = customer_id {
                CustomerService::record_purchase_tx(&mut tx, customer_id, totals.total).await?;
            }
        }

        tx.commit().await?;

        self.get(sale_id).await
    }

    /// Transition a sale between lifecycle states.
    ///
    /// Completing a draft applies the stock decrement; cancelling or
    /// refunding a completed sale restores stock. Customer totals are
    /// monotonic and are never decremented here.
    pub async fn update_status(
        &self,
        id: i64,
        input: UpdateSaleStatusInput,
        user_id: i64,
    ) -> AppResult<Sale> {
        let next = SaleStatus::parse(&input.sale_status).ok_or_else(|| {
            AppError::validation(
                "sale_status",
                "Status must be one of: draft, completed, cancelled, refunded",
            )
        })?;

        let mut tx = self.db.begin().await?;

        let row = sqlx::query_as::<_, (String, Option<i64>, Decimal, String)>(
            "SELECT sale_status, customer_id, total, sale_number FROM sales WHERE id = ? FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;

        let (current_str, customer_id, total, sale_number) = row;
        let current = SaleStatus::parse(&current_str)
            .ok_or_else(|| AppError::Internal(format!("unknown sale status: {current_str}")))?;

        if !current.can_transition_to(next) {
            return Err(AppError::conflict(format!(
                "Cannot transition sale from {} to {}",
                current.as_str(),
                next.as_str()
            )));
        }

        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, product_sku, quantity,
                   unit_price, unit_cost, discount_percentage, discount_amount, subtotal
            FROM sale_items
            WHERE sale_id = ?
            "#,
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        match (current, next) {
            (SaleStatus::Draft, SaleStatus::Completed) => {
                self.apply_stock_decrement(&mut tx, id, &sale_number, &items, user_id)
                    .await?;
                if let Some(customer_id) = customer_id {
                    CustomerService::record_purchase_tx(&mut tx, customer_id, total).await?;
                }
                sqlx::query("UPDATE sales SET payment_status = 'paid' WHERE id = ?")
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
            }
            (SaleStatus::Completed, SaleStatus::Cancelled)
            | (SaleStatus::Completed, SaleStatus::Refunded) => {
                let reference = if next == SaleStatus::Cancelled {
                    "sale_cancellation"
                } else {
                    "sale_refund"
                };
                self.restore_stock(&mut tx, id, reference, &items, user_id)
                    .await?;
            }
            // draft -> cancelled had no stock effect to undo
            _ => {}
        }

        sqlx::query("UPDATE sales SET sale_status = ? WHERE id = ?")
            .bind(next.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        self.get_sale(id).await
    }

    async fn apply_stock_decrement(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sale_id: i64,
        sale_number: &str,
        items: &[SaleItem],
        user_id: i64,
    ) -> AppResult<()> {
        for item in items {
            let product_id = item.product_id.ok_or_else(|| {
                AppError::conflict(format!(
                    "Product for item '{}' no longer exists",
                    item.product_name
                ))
            })?;

            let row = sqlx::query_as::<_, (i32, String)>(
                "SELECT stock, status FROM products WHERE id = ? FOR UPDATE",
            )
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                AppError::conflict(format!(
                    "Product for item '{}' no longer exists",
                    item.product_name
                ))
            })?;

            let (stock, status) = row;
            if status != "active" {
                return Err(AppError::conflict(format!(
                    "Product '{}' is no longer active",
                    item.product_name
                )));
            }
            if item.quantity > stock {
                return Err(AppError::Conflict {
                    message: format!("Insufficient stock for '{}'", item.product_name),
                    details: Some(serde_json::json!({
                        "product_id": product_id,
                        "requested": item.quantity,
                        "available": stock,
                    })),
                });
            }

            sqlx::query("UPDATE products SET stock = stock - ? WHERE id = ?")
                .bind(item.quantity)
                .bind(product_id)
                .execute(&mut **tx)
                .await?;

            InventoryService::record_tx(
                tx,
                NewMovement {
                    product_id,
                    movement_type: MovementType::Out,
                    quantity: item.quantity,
                    previous_stock: stock,
                    new_stock: stock - item.quantity,
                    unit_cost: item.unit_cost,
                    reference_type: Some("sale".to_string()),
                    reference_id: Some(sale_id),
                    notes: Some(sale_number.to_string()),
                    created_by: Some(user_id),
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn restore_stock(
        &self,
        tx: &mut Transaction<'_, MySql>,
        sale_id: i64,
        reference_type: &str,
        items: &[SaleItem],
        user_id: i64,
    ) -> AppResult<()> {
        for item in items {
            // Items whose product was hard-deleted have nothing to restore
            let Some(product_id) = item.product_id else {
                continue;
            };

            let stock = sqlx::query_scalar::<_, i32>(
                "SELECT stock FROM products WHERE id = ? FOR UPDATE",
            )
            .bind(product_id)
            .fetch_optional(&mut **tx)
            .await?;
            let Some(stock) = stock else {
                continue;
            };

            sqlx::query("UPDATE products SET stock = stock + ? WHERE id = ?")
                .bind(item.quantity)
                .bind(product_id)
                .execute(&mut **tx)
                .await?;

            InventoryService::record_tx(
                tx,
                NewMovement {
                    product_id,
                    movement_type: MovementType::In,
                    quantity: item.quantity,
                    previous_stock: stock,
                    new_stock: stock + item.quantity,
                    unit_cost: item.unit_cost,
                    reference_type: Some(reference_type.to_string()),
                    reference_id: Some(sale_id),
                    notes: None,
                    created_by: Some(user_id),
                },
            )
            .await?;
        }
        Ok(())
    }

    /// Get a sale with its items
    pub async fn get(&self, id: i64) -> AppResult<SaleWithItems> {
        let sale = self.get_sale(id).await?;
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, product_name, product_sku, quantity,
                   unit_price, unit_cost, discount_percentage, discount_amount, subtotal
            FROM sale_items
            WHERE sale_id = ?
            ORDER BY id ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems { sale, items })
    }

    async fn get_sale(&self, id: i64) -> AppResult<Sale> {
        sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, sale_number, customer_id, customer_name, customer_phone,
                   customer_email, subtotal, tax_rate, tax_amount, discount_amount,
                   total, payment_method, payment_status, sale_status, notes,
                   sold_by, sale_date, created_at
            FROM sales
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))
    }

    /// List sales with filters, newest first
    pub async fn list(
        &self,
        filters: SaleFilters,
        page: PageQuery,
    ) -> AppResult<Paginated<Sale>> {
        if let Some(status) = filters.status.as_deref() {
            if SaleStatus::parse(status).is_none() {
                return Err(AppError::validation("status", "Unknown sale status"));
            }
        }
        if let Some(method) = filters.payment_method.as_deref() {
            if PaymentMethod::parse(method).is_none() {
                return Err(AppError::validation("payment_method", "Unknown payment method"));
            }
        }

        let pagination = page.clamp();

        let mut count_qb = QueryBuilder::<MySql>::new("SELECT COUNT(*) FROM sales WHERE 1=1");
        Self::push_filters(&mut count_qb, &filters);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.db)
            .await?;

        let mut qb = QueryBuilder::<MySql>::new(
            r#"
            SELECT id, sale_number, customer_id, customer_name, customer_phone,
                   customer_email, subtotal, tax_rate, tax_amount, discount_amount,
                   total, payment_method, payment_status, sale_status, notes,
                   sold_by, sale_date, created_at
            FROM sales WHERE 1=1
            "#,
        );
        Self::push_filters(&mut qb, &filters);
        qb.push(" ORDER BY sale_date DESC, id DESC LIMIT ");
        qb.push_bind(pagination.limit);
        qb.push(" OFFSET ");
        qb.push_bind(pagination.offset());

        let sales = qb.build_query_as::<Sale>().fetch_all(&self.db).await?;

        Ok(Paginated::new(sales, pagination, total as u64))
    }

    fn push_filters(qb: &mut QueryBuilder<'_, MySql>, filters: &SaleFilters) {
        if let Some(status) = filters.status.as_deref() {
            qb.push(" AND sale_status = ");
            qb.push_bind(status.to_string());
        }
        if let Some(method) = filters.payment_method.as_deref() {
            qb.push(" AND payment_method = ");
            qb.push_bind(method.to_string());
        }
        if let Some(customer_id) = filters.customer_id {
            qb.push(" AND customer_id = ");
            qb.push_bind(customer_id);
        }
        if let Some(from) = filters.date_from {
            qb.push(" AND DATE(sale_date) >= ");
            qb.push_bind(from);
        }
        if let Some(to) = filters.date_to {
            qb.push(" AND DATE(sale_date) <= ");
            qb.push_bind(to);
        }
    }

    /// Sales for one customer, newest first
    pub async fn for_customer(
        &self,
        customer_id: i64,
        page: PageQuery,
    ) -> AppResult<Paginated<Sale>> {
        let exists =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customers WHERE id = ?")
                .bind(customer_id)
                .fetch_one(&self.db)
                .await?;
        if exists == 0 {
            return Err(AppError::NotFound("Customer".to_string()));
        }

        self.list(
            SaleFilters {
                customer_id: Some(customer_id),
                ..Default::default()
            },
            page,
        )
        .await
    }

    /// Aggregate statistics over a date range. Revenue counts completed
    /// sales only.
    pub async fn stats(
        &self,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> AppResult<SaleStats> {
        let from = date_from.unwrap_or(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
        let to = date_to.unwrap_or(NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());

        let stats = sqlx::query_as::<_, SaleStats>(
            r#"
            SELECT COUNT(*) AS total_sales,
                   COALESCE(SUM(CASE WHEN sale_status = 'completed' THEN total ELSE 0 END), 0) AS total_revenue,
                   AVG(CASE WHEN sale_status = 'completed' THEN total END) AS average_sale,
                   CAST(COALESCE(SUM(sale_status = 'completed'), 0) AS SIGNED) AS completed,
                   CAST(COALESCE(SUM(sale_status = 'draft'), 0) AS SIGNED) AS draft,
                   CAST(COALESCE(SUM(sale_status = 'cancelled'), 0) AS SIGNED) AS cancelled,
                   CAST(COALESCE(SUM(sale_status = 'refunded'), 0) AS SIGNED) AS refunded
            FROM sales
            WHERE DATE(sale_date) BETWEEN ? AND ?
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.db)
        .await?;

        Ok(stats)
    }

    /// Allocate the next `V-<year>-NNNN` number. The year's existing
    /// numbers are read under lock so the sequence cannot fork.
    async fn next_sale_number(&self, tx: &mut Transaction<'_, MySql>) -> AppResult<String> {
        let year = Utc::now().year();
        let existing = sqlx::query_scalar::<_, String>(
            "SELECT sale_number FROM sales WHERE sale_number LIKE ? FOR UPDATE",
        )
        .bind(format!("V-{}-%", year))
        .fetch_all(&mut **tx)
        .await?;

        Ok(Self::format_sale_number(year, Self::next_sequence(&existing)))
    }

    fn format_sale_number(year: i32, seq: u32) -> String {
        format!("V-{}-{:04}", year, seq)
    }

    /// Numeric suffix of a sale number, if well-formed
    fn parse_sale_sequence(sale_number: &str) -> Option<u32> {
        sale_number.rsplit('-').next()?.parse().ok()
    }

    /// Highest existing sequence plus one, starting at 1
    fn next_sequence(existing: &[String]) -> u32 {
        existing
            .iter()
            .filter_map(|n| Self::parse_sale_sequence(n))
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_number_format() {
        assert_eq!(SaleService::format_sale_number(2025, 1), "V-2025-0001");
        assert_eq!(SaleService::format_sale_number(2025, 42), "V-2025-0042");
        // Sequences past 9999 keep growing rather than wrapping
        assert_eq!(SaleService::format_sale_number(2025, 10000), "V-2025-10000");
    }

    #[test]
    fn sale_sequence_parsing() {
        assert_eq!(SaleService::parse_sale_sequence("V-2025-0001"), Some(1));
        assert_eq!(SaleService::parse_sale_sequence("V-2025-0137"), Some(137));
        assert_eq!(SaleService::parse_sale_sequence("garbage"), None);
    }

    #[test]
    fn next_sequence_starts_at_one() {
        assert_eq!(SaleService::next_sequence(&[]), 1);
    }

    #[test]
    fn next_sequence_is_numeric_not_lexicographic() {
        let existing = vec![
            "V-2025-0009".to_string(),
            "V-2025-0137".to_string(),
            "V-2025-0100".to_string(),
        ];
        assert_eq!(SaleService::next_sequence(&existing), 138);
    }

    #[test]
    fn next_sequence_skips_malformed_numbers() {
        let existing = vec!["V-2025-XXXX".to_string(), "V-2025-0003".to_string()];
        assert_eq!(SaleService::next_sequence(&existing), 4);
    }
}
